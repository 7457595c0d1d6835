//! Integration tests for the announcement query.
//!
//! Each test creates its own in-memory SQLite database, loads a handful of
//! update/metadata rows and checks which of them the query returns.

mod common;

use arxiv_feed::storage::{Database, MetadataRow, QueryLimits, UpdateAction, UpdateRow};
use common::{announce, day, metadata, test_db};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn document_ids(rows: &[(UpdateRow, MetadataRow)]) -> Vec<i64> {
    rows.iter().map(|(u, _)| u.document_id).collect()
}

// ============================================================================
// Matching
// ============================================================================

#[tokio::test]
async fn test_empty_scope_returns_nothing() {
    let db = test_db().await;
    announce(&db, 1, 1, day(26), UpdateAction::New, "cs.AI").await;

    let rows = db
        .get_announce_papers(day(26), day(26), &[], &[], &QueryLimits::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_category_or_archive_match() {
    let db = test_db().await;
    announce(&db, 1, 1, day(26), UpdateAction::New, "cs.AI").await;
    announce(&db, 2, 1, day(26), UpdateAction::New, "math.CO").await;
    announce(&db, 3, 1, day(26), UpdateAction::New, "astro-ph.GA").await;
    announce(&db, 4, 1, day(26), UpdateAction::Cross, "cs.LG").await;

    let rows = db
        .get_announce_papers(
            day(26),
            day(26),
            &strings(&["math"]),
            &strings(&["cs.AI"]),
            &QueryLimits::default(),
        )
        .await
        .unwrap();
    assert_eq!(document_ids(&rows), vec![1, 2]);

    let archives_only = db
        .get_announce_papers(
            day(26),
            day(26),
            &strings(&["cs"]),
            &[],
            &QueryLimits::default(),
        )
        .await
        .unwrap();
    assert_eq!(document_ids(&archives_only), vec![1, 4]);
}

#[tokio::test]
async fn test_date_range_is_inclusive() {
    let db = test_db().await;
    announce(&db, 1, 1, day(25), UpdateAction::New, "cs.AI").await;
    announce(&db, 2, 1, day(26), UpdateAction::New, "cs.AI").await;
    announce(&db, 3, 1, day(27), UpdateAction::New, "cs.AI").await;
    announce(&db, 4, 1, day(28), UpdateAction::New, "cs.AI").await;

    let rows = db
        .get_announce_papers(
            day(26),
            day(27),
            &[],
            &strings(&["cs.AI"]),
            &QueryLimits::default(),
        )
        .await
        .unwrap();
    assert_eq!(document_ids(&rows), vec![2, 3]);
    assert_eq!(rows[0].0.date, day(26));
    assert_eq!(rows[1].0.date, day(27));
}

#[tokio::test]
async fn test_single_day_excludes_next_day() {
    let db = test_db().await;
    announce(&db, 1, 1, day(26), UpdateAction::New, "cs.AI").await;
    announce(&db, 2, 1, day(27), UpdateAction::New, "cs.AI").await;

    let rows = db
        .get_announce_papers(
            day(26),
            day(26),
            &[],
            &strings(&["cs.AI"]),
            &QueryLimits::default(),
        )
        .await
        .unwrap();
    assert_eq!(document_ids(&rows), vec![1]);
    assert_eq!(rows[0].0.date, day(26));
}

// ============================================================================
// Action Filters
// ============================================================================

#[tokio::test]
async fn test_abs_only_excluded() {
    let db = test_db().await;
    announce(&db, 1, 1, day(26), UpdateAction::AbsOnly, "cs.AI").await;
    announce(&db, 2, 1, day(26), UpdateAction::Repcro, "cs.AI").await;

    let rows = db
        .get_announce_papers(
            day(26),
            day(26),
            &[],
            &strings(&["cs.AI"]),
            &QueryLimits::default(),
        )
        .await
        .unwrap();
    assert_eq!(document_ids(&rows), vec![2]);
}

#[tokio::test]
async fn test_late_replacements_excluded() {
    let db = test_db().await;
    announce(&db, 1, 4, day(26), UpdateAction::Replace, "cs.AI").await;
    announce(&db, 2, 5, day(26), UpdateAction::Replace, "cs.AI").await;
    // New announcements are never version-filtered
    announce(&db, 3, 7, day(26), UpdateAction::New, "cs.AI").await;

    let scope = strings(&["cs.AI"]);
    let rows = db
        .get_announce_papers(day(26), day(26), &[], &scope, &QueryLimits::default())
        .await
        .unwrap();
    assert_eq!(document_ids(&rows), vec![1, 3]);

    let strict = QueryLimits {
        replace_version_threshold: 3,
        ..QueryLimits::default()
    };
    let rows = db
        .get_announce_papers(day(26), day(26), &[], &scope, &strict)
        .await
        .unwrap();
    assert_eq!(document_ids(&rows), vec![3]);
}

// ============================================================================
// Metadata Join
// ============================================================================

#[tokio::test]
async fn test_only_current_metadata_joined() {
    let db = test_db().await;
    announce(&db, 1, 1, day(26), UpdateAction::New, "cs.AI").await;

    let mut v2 = metadata(1, 2, "cs.AI");
    v2.title = "Paper 1, revised".to_string();
    db.upsert_metadata(&v2).await.unwrap();

    let rows = db
        .get_announce_papers(
            day(26),
            day(26),
            &[],
            &strings(&["cs.AI"]),
            &QueryLimits::default(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let (update, metadata) = &rows[0];
    assert_eq!(update.version, 1);
    assert_eq!(metadata.version, 2);
    assert_eq!(metadata.title, "Paper 1, revised");
    assert!(metadata.is_current);
}

#[tokio::test]
async fn test_result_limit() {
    let db = test_db().await;
    for id in 1..=20 {
        announce(&db, id, 1, day(26), UpdateAction::New, "cs.AI").await;
    }

    let scope = strings(&["cs.AI"]);
    let rows = db
        .get_announce_papers(day(26), day(26), &[], &scope, &QueryLimits::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 15);
    assert_eq!(document_ids(&rows), (1..=15).collect::<Vec<_>>());

    let small = QueryLimits {
        result_limit: 3,
        ..QueryLimits::default()
    };
    let rows = db
        .get_announce_papers(day(26), day(26), &[], &scope, &small)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_reopen_is_idempotent() {
    let path = std::env::temp_dir().join("arxiv_feed_reopen_test.db");
    std::fs::remove_file(&path).ok();
    let path_str = path.to_str().unwrap();

    {
        let db = Database::open(path_str).await.unwrap();
        announce(&db, 1, 1, day(26), UpdateAction::New, "cs.AI").await;
    }

    let db = Database::open(path_str).await.unwrap();
    let rows = db
        .get_announce_papers(
            day(26),
            day(26),
            &[],
            &strings(&["cs.AI"]),
            &QueryLimits::default(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    std::fs::remove_file(&path).ok();
}
