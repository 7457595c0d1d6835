//! Domain types for arXiv e-prints as they appear in a feed.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// An e-print's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub last_name: String,
    pub full_name: String,
    pub initials: String,
    pub affiliations: Vec<String>,
}

/// An arXiv category, e.g. `cs.AI` / "Artificial Intelligence".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Downloadable representations of an e-print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Pdf,
    Ps,
    Html,
    Other,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Ps => "ps",
            Format::Html => "html",
            Format::Other => "other",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media item attached to a feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub title: String,
    pub url: String,
    pub format: Format,
}

impl Media {
    /// MIME type advertised for this media item.
    pub fn media_type(&self) -> String {
        match self.format {
            Format::Pdf | Format::Ps => format!("application/{}", self.format),
            _ => "text/html".to_string(),
        }
    }
}

/// An arXiv e-print, assembled from one update row and its current metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub arxiv_id: String,
    pub archive_name: String,
    pub paper_id: String,
    pub version: i64,
    pub title: String,
    pub r#abstract: String,
    pub submitted_date: NaiveDate,
    pub updated_date: NaiveDate,
    pub comments: Option<String>,
    pub journal_ref: Option<String>,
    pub doi: Option<String>,
    pub formats: Vec<Format>,
    pub authors: Vec<Author>,
    pub primary_category: Category,
    /// Cross-listed categories, never including the primary.
    pub secondary_categories: Vec<Category>,
}

impl Document {
    /// Individual DOIs; the metadata field may hold several separated by whitespace.
    pub fn dois(&self) -> Vec<&str> {
        self.doi
            .as_deref()
            .map(|d| d.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Documents found for one feed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSet {
    /// The archives and categories that were searched.
    pub categories: Vec<String>,
    pub documents: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(format: Format) -> Media {
        Media {
            title: format.as_str().to_uppercase(),
            url: "https://arxiv.org/x".to_string(),
            format,
        }
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media(Format::Pdf).media_type(), "application/pdf");
        assert_eq!(media(Format::Ps).media_type(), "application/ps");
        assert_eq!(media(Format::Html).media_type(), "text/html");
        assert_eq!(media(Format::Other).media_type(), "text/html");
    }

    #[test]
    fn test_format_serializes_lowercase() {
        assert_eq!(Format::Pdf.to_string(), "pdf");
        assert_eq!(Format::Other.as_str(), "other");
    }
}
