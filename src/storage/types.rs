use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The announcement database is locked by another process. Please try again.")]
    Locked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::Locked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) surface only
/// through their messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Row Types
// ============================================================================

/// Kind of announcement event recorded in `arxiv_updates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum UpdateAction {
    New,
    Replace,
    Cross,
    Repcro,
    AbsOnly,
}

/// One announce/replace/cross/abs_only event for a document on a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRow {
    pub document_id: i64,
    pub version: i64,
    pub date: NaiveDate,
    pub action: UpdateAction,
    pub archive: String,
    /// Blank for single-category archives such as `hep-lat`.
    pub category: String,
}

/// A versioned descriptive record for a document.
///
/// Multi-valued fields use the legacy encodings: `authors` is a delimited
/// author/affiliation string, `abs_categories` is space separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub metadata_id: i64,
    pub document_id: i64,
    pub paper_id: String,
    pub title: String,
    pub authors: String,
    pub abs_categories: Option<String>,
    pub comments: Option<String>,
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
    pub r#abstract: String,
    pub created: NaiveDateTime,
    pub version: i64,
    pub is_current: bool,
    pub source_format: Option<String>,
    pub source_flags: Option<String>,
}

/// Limits applied by the announcement query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    /// Maximum number of rows returned.
    pub result_limit: i64,
    /// `replace` events above this version are not announced.
    pub replace_version_threshold: i64,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            result_limit: 15,
            replace_version_threshold: 4,
        }
    }
}

/// Internal row type for the update/metadata join (used by sqlx FromRow).
/// Converts to the public pair via into_pair()
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnnounceDbRow {
    pub u_document_id: i64,
    pub u_version: i64,
    pub u_date: NaiveDate,
    pub u_action: UpdateAction,
    pub u_archive: String,
    pub u_category: String,
    pub metadata_id: i64,
    pub m_document_id: i64,
    pub paper_id: String,
    pub title: String,
    pub authors: String,
    pub abs_categories: Option<String>,
    pub comments: Option<String>,
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
    pub m_abstract: String,
    pub created: NaiveDateTime,
    pub m_version: i64,
    pub is_current: bool,
    pub source_format: Option<String>,
    pub source_flags: Option<String>,
}

impl AnnounceDbRow {
    pub(crate) fn into_pair(self) -> (UpdateRow, MetadataRow) {
        (
            UpdateRow {
                document_id: self.u_document_id,
                version: self.u_version,
                date: self.u_date,
                action: self.u_action,
                archive: self.u_archive,
                category: self.u_category,
            },
            MetadataRow {
                metadata_id: self.metadata_id,
                document_id: self.m_document_id,
                paper_id: self.paper_id,
                title: self.title,
                authors: self.authors,
                abs_categories: self.abs_categories,
                comments: self.comments,
                journal_ref: self.journal_ref,
                doi: self.doi,
                r#abstract: self.m_abstract,
                created: self.created,
                version: self.m_version,
                is_current: self.is_current,
                source_format: self.source_format,
                source_flags: self.source_flags,
            },
        )
    }
}
