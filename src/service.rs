//! Feed orchestration: specifier -> announcement query -> documents -> XML.
//!
//! [`FeedService`] is the only component that touches both the database and
//! the feed builder. Everything after the query is synchronous and lives in
//! [`render_feed`], which tests can drive without a database.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::assembler::assemble;
use crate::cache::{CacheKey, FeedCache};
use crate::config::Config;
use crate::domain::{Document, DocumentSet, Format, Media};
use crate::feed::{
    ArxivAtomExtension, ArxivEntryExtension, ArxivExtension, ExtensionScope, FeedBuilder,
    FeedEntry, FeedFormat, RenderError,
};
use crate::specifier::{validate, ArchiveCategorySpec, SpecifierError};
use crate::storage::{Database, DatabaseError};

/// Resolver used for DOI links.
const DOI_RESOLVER: &str = "https://doi.org/";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum FeedError {
    /// Shown to callers verbatim.
    #[error(transparent)]
    InvalidSpecifier(#[from] SpecifierError),

    #[error("Invalid date range: {first_day} is after {last_day}")]
    InvalidDateRange {
        first_day: NaiveDate,
        last_day: NaiveDate,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Failed to serialize feed: {0}")]
    Render(#[from] RenderError),
}

// ============================================================================
// Request
// ============================================================================

/// One feed to build: which archives/categories, in which format, over which days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub specifier: String,
    pub format: FeedFormat,
    /// Inclusive.
    pub first_day: NaiveDate,
    /// Inclusive.
    pub last_day: NaiveDate,
}

impl FeedRequest {
    pub fn new(
        specifier: impl Into<String>,
        format: FeedFormat,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Self {
        Self {
            specifier: specifier.into(),
            format,
            first_day,
            last_day,
        }
    }

    /// Announcements of a single day.
    pub fn for_day(specifier: impl Into<String>, format: FeedFormat, day: NaiveDate) -> Self {
        Self::new(specifier, format, day, day)
    }

    fn validate(&self) -> Result<ArchiveCategorySpec, FeedError> {
        let spec = validate(&self.specifier)?;
        if self.first_day > self.last_day {
            return Err(FeedError::InvalidDateRange {
                first_day: self.first_day,
                last_day: self.last_day,
            });
        }
        Ok(spec)
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct FeedService {
    db: Database,
    config: Config,
    cache: FeedCache,
}

impl FeedService {
    pub fn new(db: Database, config: Config) -> Self {
        let cache = FeedCache::new(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_seconds),
        );
        Self { db, config, cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Validates the request and assembles the announced documents, in query order.
    pub async fn documents(&self, request: &FeedRequest) -> Result<DocumentSet, FeedError> {
        let spec = request.validate()?;
        self.fetch_documents(&spec, request).await
    }

    /// Builds the serialized feed for `request`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid specifier or date range, a database error, or an
    /// XML writer error. Rows that cannot be assembled are logged and left
    /// out of the feed.
    pub async fn build_feed(&self, request: &FeedRequest) -> Result<String, FeedError> {
        let spec = request.validate()?;
        let key = CacheKey {
            spec: spec.clone(),
            format: request.format,
            first_day: request.first_day,
            last_day: request.last_day,
        };

        if let Some(rendered) = self.cache.get(&key) {
            tracing::debug!(specifier = %spec.to_specifier(), format = %request.format, "Feed cache hit");
            return Ok(rendered.to_string());
        }

        let documents = self.fetch_documents(&spec, request).await?;
        let rendered = render_feed(
            &self.config.base_server,
            &documents,
            request.format,
            Utc::now(),
        )?;

        tracing::info!(
            specifier = %spec.to_specifier(),
            format = %request.format,
            entries = documents.documents.len(),
            "Built feed"
        );
        self.cache.insert(key, Arc::from(rendered.as_str()));
        Ok(rendered)
    }

    async fn fetch_documents(
        &self,
        spec: &ArchiveCategorySpec,
        request: &FeedRequest,
    ) -> Result<DocumentSet, FeedError> {
        let rows = self
            .db
            .get_announce_papers(
                request.first_day,
                request.last_day,
                &spec.archives,
                &spec.categories,
                &self.config.query_limits(),
            )
            .await?;
        tracing::debug!(
            rows = rows.len(),
            first_day = %request.first_day,
            last_day = %request.last_day,
            "Fetched announcements"
        );

        // A row that cannot be assembled loses only its own entry.
        let documents = rows
            .iter()
            .filter_map(|(update, metadata)| match assemble(update, metadata) {
                Ok(document) => Some(document),
                Err(e) => {
                    tracing::error!(
                        document_id = update.document_id,
                        paper_id = %metadata.paper_id,
                        error = %e,
                        "Failed to assemble document, skipping"
                    );
                    None
                }
            })
            .collect();

        Ok(DocumentSet {
            categories: spec.all_codes(),
            documents,
        })
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Serializes `documents` as a feed. Entry order follows `documents`.
pub fn render_feed(
    base_server: &str,
    documents: &DocumentSet,
    format: FeedFormat,
    updated: DateTime<Utc>,
) -> Result<String, RenderError> {
    let scope = documents.categories.join("+");
    let mut builder = FeedBuilder::new(
        format!("https://{base_server}/rss/{scope}"),
        format!("{scope} updates on arXiv.org"),
        format!("https://{base_server}/"),
        updated,
    );
    builder.description = format!("{scope} updates on the arXiv.org e-print archive.");
    builder.language = Some("en-us".to_string());
    builder.register_extension(ArxivExtension, ExtensionScope::Both);

    for document in &documents.documents {
        builder.add_entry(build_entry(base_server, document));
    }

    builder.render(format)
}

fn build_entry(base_server: &str, document: &Document) -> FeedEntry {
    let mut entry = FeedEntry::new(
        format!("oai:arXiv.org:{}v{}", document.arxiv_id, document.version),
        document.title.clone(),
        format!("https://{base_server}/abs/{}", document.arxiv_id),
        midnight_utc(document.updated_date),
    );
    entry.summary = Some(document.r#abstract.clone());
    entry.published = Some(midnight_utc(document.submitted_date));
    entry.authors = document
        .authors
        .iter()
        .map(|a| a.full_name.clone())
        .collect();
    entry.categories = std::iter::once(&document.primary_category)
        .chain(&document.secondary_categories)
        .map(|c| c.id.clone())
        .collect();

    entry.register_extension(arxiv_extension(base_server, document), ExtensionScope::Both);
    entry.register_extension(ArxivAtomExtension, ExtensionScope::AtomOnly);
    entry
}

fn arxiv_extension(base_server: &str, document: &Document) -> ArxivEntryExtension {
    let mut ext = ArxivEntryExtension::new(base_server);

    for author in &document.authors {
        if !author.affiliations.is_empty() {
            ext.set_affiliation(author.full_name.clone(), author.affiliations.clone());
        }
        ext.add_author(author.clone());
    }
    if let Some(comment) = &document.comments {
        ext.set_comment(comment.clone());
    }
    ext.set_primary_category(document.primary_category.clone());
    if let Some(journal_ref) = &document.journal_ref {
        ext.set_journal_ref(journal_ref.clone());
    }

    let dois: BTreeMap<String, String> = document
        .dois()
        .into_iter()
        .map(|doi| (doi.to_string(), format!("{DOI_RESOLVER}{doi}")))
        .collect();
    if !dois.is_empty() {
        ext.set_doi(dois);
    }

    for format in &document.formats {
        ext.add_media(media_for(base_server, &document.arxiv_id, *format));
    }
    ext
}

fn media_for(base_server: &str, arxiv_id: &str, format: Format) -> Media {
    let path = match format {
        Format::Pdf => "pdf",
        Format::Ps => "ps",
        Format::Html => "html",
        Format::Other => "format",
    };
    Media {
        title: format.as_str().to_uppercase(),
        url: format!("https://{base_server}/{path}/{arxiv_id}"),
        format,
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
