use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::{is_lock_message, DatabaseError};

// ============================================================================
// Database
// ============================================================================

/// Handle to the announcement database (`arxiv_updates` + `arxiv_metadata`).
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations
    ///
    /// `path` may be `:memory:` for an isolated in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Locked` if another process holds the database
    /// lock (SQLITE_BUSY, SQLITE_LOCKED, SQLITE_CANTOPEN).
    /// Returns `DatabaseError::Migration` if the schema cannot be created.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: SQLite waits up to 5 seconds for locks to release before returning SQLITE_BUSY.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        let db = Self { pool };
        db.migrate().await.map_err(|e| {
            if is_lock_message(&e.to_string()) {
                DatabaseError::Locked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })?;
        tracing::debug!(path = %path, "Opened announcement database");
        Ok(db)
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// All statements use `IF NOT EXISTS`, so re-running on an existing
    /// database is a no-op.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // One row per announcement event. `category` is blank for
        // single-category archives.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS arxiv_updates (
                id INTEGER PRIMARY KEY,
                document_id INTEGER NOT NULL,
                version INTEGER NOT NULL DEFAULT 1,
                date TEXT NOT NULL,
                action TEXT NOT NULL,
                archive TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT ''
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS arxiv_metadata (
                metadata_id INTEGER PRIMARY KEY,
                document_id INTEGER NOT NULL,
                paper_id TEXT NOT NULL,
                title TEXT NOT NULL,
                authors TEXT NOT NULL,
                abs_categories TEXT,
                comments TEXT,
                journal_ref TEXT,
                doi TEXT,
                abstract TEXT NOT NULL,
                created TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 1,
                is_current INTEGER NOT NULL DEFAULT 1,
                source_format TEXT,
                source_flags TEXT,
                UNIQUE(document_id, version)
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // Covers the announcement query: date range scan, then category/archive filter
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_updates_date ON arxiv_updates(date)")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_updates_category_date ON arxiv_updates(category, date)",
        )
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_updates_archive_date ON arxiv_updates(archive, date)",
        )
        .execute(&mut *tx)
        .await?;

        // Partial index: the join only ever targets the current version
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_metadata_current ON arxiv_metadata(document_id) WHERE is_current = 1",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_tables() {
        let db = Database::open(":memory:").await.unwrap();
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'arxiv_%' ORDER BY name",
        )
        .fetch_all(&db.pool)
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(names, vec!["arxiv_metadata", "arxiv_updates"]);
    }

    #[tokio::test]
    async fn test_migrate_twice_is_noop() {
        let db = Database::open(":memory:").await.unwrap();
        db.migrate().await.unwrap();
    }
}
