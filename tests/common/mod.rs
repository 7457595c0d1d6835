//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use arxiv_feed::storage::{Database, MetadataRow, UpdateAction, UpdateRow};
use chrono::NaiveDate;

pub async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 10, d).unwrap()
}

pub fn update(
    document_id: i64,
    version: i64,
    date: NaiveDate,
    action: UpdateAction,
    category: &str,
) -> UpdateRow {
    let archive = category.split('.').next().unwrap_or_default().to_string();
    UpdateRow {
        document_id,
        version,
        date,
        action,
        archive,
        category: if category.contains('.') {
            category.to_string()
        } else {
            String::new()
        },
    }
}

pub fn metadata(document_id: i64, version: i64, category: &str) -> MetadataRow {
    MetadataRow {
        metadata_id: document_id * 100 + version,
        document_id,
        paper_id: format!("2310.{document_id:05}"),
        title: format!("Paper {document_id}"),
        authors: "Very Real Sr. (Cornell University), L Emeno".to_string(),
        abs_categories: Some(category.to_string()),
        comments: None,
        journal_ref: None,
        doi: None,
        r#abstract: format!("Abstract of paper {document_id}."),
        created: day(25).and_hms_opt(12, 0, 0).unwrap(),
        version,
        is_current: true,
        source_format: Some("tex".to_string()),
        source_flags: None,
    }
}

/// Inserts a current metadata row and one announcement for it.
pub async fn announce(
    db: &Database,
    document_id: i64,
    version: i64,
    date: NaiveDate,
    action: UpdateAction,
    category: &str,
) {
    db.upsert_metadata(&metadata(document_id, version, category))
        .await
        .unwrap();
    db.insert_update(&update(document_id, version, date, action, category))
        .await
        .unwrap();
}
