use chrono::NaiveDate;
use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{AnnounceDbRow, DatabaseError, MetadataRow, QueryLimits, UpdateAction, UpdateRow};

impl Database {
    // ========================================================================
    // Announcement Query
    // ========================================================================

    /// Announced papers in `[first_day, last_day]` (inclusive) whose category is
    /// in `categories` or whose archive is in `archives`.
    ///
    /// - `abs_only` events are excluded
    /// - `replace` events are included only up to `limits.replace_version_threshold`
    /// - each event is joined to the document's current metadata row
    /// - at most `limits.result_limit` rows are returned, so callers must treat
    ///   the result as a bounded sample rather than a complete listing
    pub async fn get_announce_papers(
        &self,
        first_day: NaiveDate,
        last_day: NaiveDate,
        archives: &[String],
        categories: &[String],
        limits: &QueryLimits,
    ) -> Result<Vec<(UpdateRow, MetadataRow)>, DatabaseError> {
        if archives.is_empty() && categories.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            r#"
            SELECT
                u.document_id AS u_document_id, u.version AS u_version, u.date AS u_date,
                u.action AS u_action, u.archive AS u_archive, u.category AS u_category,
                m.metadata_id, m.document_id AS m_document_id, m.paper_id, m.title,
                m.authors, m.abs_categories, m.comments, m.journal_ref, m.doi,
                m.abstract AS m_abstract, m.created, m.version AS m_version,
                m.is_current, m.source_format, m.source_flags
            FROM arxiv_updates u
            JOIN arxiv_metadata m ON u.document_id = m.document_id
            WHERE (u.category IN ("#,
        );

        {
            let mut separated = builder.separated(", ");
            for category in categories {
                separated.push_bind(category.as_str());
            }
            separated.push_unseparated(") OR u.archive IN (");
        }
        {
            let mut separated = builder.separated(", ");
            for archive in archives {
                separated.push_bind(archive.as_str());
            }
            separated.push_unseparated("))");
        }

        builder
            .push(" AND (u.action != ")
            .push_bind(UpdateAction::Replace)
            .push(" OR u.version <= ")
            .push_bind(limits.replace_version_threshold)
            .push(") AND u.action != ")
            .push_bind(UpdateAction::AbsOnly)
            .push(" AND u.date >= ")
            .push_bind(first_day)
            .push(" AND u.date <= ")
            .push_bind(last_day)
            .push(" AND m.is_current = 1")
            .push(" ORDER BY u.date, u.id LIMIT ")
            .push_bind(limits.result_limit);

        let rows = builder
            .build_query_as::<AnnounceDbRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        tracing::debug!(
            %first_day,
            %last_day,
            archives = archives.len(),
            categories = categories.len(),
            rows = rows.len(),
            "Fetched announced papers"
        );

        Ok(rows.into_iter().map(AnnounceDbRow::into_pair).collect())
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Record an announcement event
    pub async fn insert_update(&self, update: &UpdateRow) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO arxiv_updates (document_id, version, date, action, archive, category)
            VALUES (?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(update.document_id)
        .bind(update.version)
        .bind(update.date)
        .bind(update.action)
        .bind(&update.archive)
        .bind(&update.category)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Insert or replace a metadata version. A current row demotes any other
    /// current version of the same document.
    pub async fn upsert_metadata(&self, metadata: &MetadataRow) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_sqlx)?;

        if metadata.is_current {
            sqlx::query(
                "UPDATE arxiv_metadata SET is_current = 0 WHERE document_id = ? AND version != ?",
            )
            .bind(metadata.document_id)
            .bind(metadata.version)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        }

        sqlx::query(
            r#"
            INSERT INTO arxiv_metadata (
                metadata_id, document_id, paper_id, title, authors, abs_categories,
                comments, journal_ref, doi, abstract, created, version, is_current,
                source_format, source_flags
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(document_id, version) DO UPDATE SET
                paper_id = excluded.paper_id,
                title = excluded.title,
                authors = excluded.authors,
                abs_categories = excluded.abs_categories,
                comments = excluded.comments,
                journal_ref = excluded.journal_ref,
                doi = excluded.doi,
                abstract = excluded.abstract,
                created = excluded.created,
                is_current = excluded.is_current,
                source_format = excluded.source_format,
                source_flags = excluded.source_flags
        "#,
        )
        .bind(metadata.metadata_id)
        .bind(metadata.document_id)
        .bind(&metadata.paper_id)
        .bind(&metadata.title)
        .bind(&metadata.authors)
        .bind(&metadata.abs_categories)
        .bind(&metadata.comments)
        .bind(&metadata.journal_ref)
        .bind(&metadata.doi)
        .bind(&metadata.r#abstract)
        .bind(metadata.created)
        .bind(metadata.version)
        .bind(metadata.is_current)
        .bind(&metadata.source_format)
        .bind(&metadata.source_flags)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_sqlx)?;

        tx.commit().await.map_err(DatabaseError::from_sqlx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata_row() -> MetadataRow {
        let created = NaiveDate::from_ymd_opt(2023, 10, 25)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        MetadataRow {
            metadata_id: 101,
            document_id: 1,
            paper_id: "2310.00001".to_string(),
            title: "Paper 1".to_string(),
            authors: "L Emeno".to_string(),
            abs_categories: Some("cs.AI".to_string()),
            comments: None,
            journal_ref: None,
            doi: None,
            r#abstract: "Abstract.".to_string(),
            created,
            version: 1,
            is_current: true,
            source_format: None,
            source_flags: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_metadata_reports_lock() {
        let path = std::env::temp_dir().join(format!(
            "arxiv_feed_upsert_lock_{}.db",
            std::process::id()
        ));
        let path_str = path.to_string_lossy().to_string();
        let holder = Database::open(&path_str).await.unwrap();
        let writer = Database::open(&path_str).await.unwrap();

        // An open write transaction keeps every other connection from writing
        let mut tx = holder.pool.begin().await.unwrap();
        sqlx::query("UPDATE arxiv_metadata SET is_current = is_current")
            .execute(&mut *tx)
            .await
            .unwrap();

        let err = writer.upsert_metadata(&metadata_row()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Locked), "got {err:?}");

        tx.rollback().await.unwrap();
        writer.upsert_metadata(&metadata_row()).await.unwrap();

        drop((holder, writer));
        for suffix in ["", "-wal", "-shm"] {
            std::fs::remove_file(format!("{path_str}{suffix}")).ok();
        }
    }
}
