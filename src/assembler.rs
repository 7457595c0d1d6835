//! Assembly of [`Document`]s from raw update/metadata row pairs.
//!
//! The metadata row stores several multi-valued fields in legacy delimited
//! encodings. They are parsed strictly: malformed data is reported as an
//! [`AssemblyError`] rather than repaired.

use thiserror::Error;

use crate::domain::{Author, Category, Document, Format};
use crate::storage::{MetadataRow, UpdateRow};
use crate::taxonomy::taxonomy;

/// Generational suffixes skipped when picking an author's last name.
const NAME_SUFFIXES: &[&str] = &["Jr", "Jr.", "Sr", "Sr.", "II", "III", "IV"];

/// Problems in a delimited author string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorParseError {
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("nested parentheses")]
    NestedParentheses,

    #[error("empty author name in group {0}")]
    EmptyName(usize),

    #[error("empty affiliation for '{0}'")]
    EmptyAffiliation(String),

    #[error("unexpected text after affiliations of '{0}'")]
    TrailingText(String),
}

/// Data-integrity errors raised while assembling a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Malformed author list for {paper_id}: {source}")]
    MalformedAuthors {
        paper_id: String,
        #[source]
        source: AuthorParseError,
    },

    #[error("Unknown archive '{code}' for {paper_id}")]
    UnknownArchive { paper_id: String, code: String },

    #[error("Unknown category '{code}' for {paper_id}")]
    UnknownCategory { paper_id: String, code: String },

    #[error("Metadata for document {metadata} does not match update for document {update}")]
    DocumentMismatch { update: i64, metadata: i64 },
}

/// Builds a [`Document`] from an announcement event and its metadata.
///
/// Pure: the same inputs always produce equal documents.
pub fn assemble(update: &UpdateRow, metadata: &MetadataRow) -> Result<Document, AssemblyError> {
    if update.document_id != metadata.document_id {
        return Err(AssemblyError::DocumentMismatch {
            update: update.document_id,
            metadata: metadata.document_id,
        });
    }

    let arxiv_id = metadata.paper_id.trim().to_string();
    let tax = taxonomy();

    let archive = tax
        .archive(&update.archive)
        .ok_or_else(|| AssemblyError::UnknownArchive {
            paper_id: arxiv_id.clone(),
            code: update.archive.clone(),
        })?;

    let primary_code = if update.category.trim().is_empty() {
        update.archive.trim()
    } else {
        update.category.trim()
    };
    let primary_category = lookup_category(&arxiv_id, primary_code)?;

    let mut secondary_categories: Vec<Category> = Vec::new();
    for code in metadata
        .abs_categories
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
    {
        let category = lookup_category(&arxiv_id, code)?;
        if category.id != primary_category.id
            && !secondary_categories.iter().any(|c| c.id == category.id)
        {
            secondary_categories.push(category);
        }
    }

    let authors =
        parse_authors(&metadata.authors).map_err(|source| AssemblyError::MalformedAuthors {
            paper_id: arxiv_id.clone(),
            source,
        })?;

    let paper_id = arxiv_id
        .rsplit_once('/')
        .map_or(arxiv_id.as_str(), |(_, number)| number)
        .to_string();

    Ok(Document {
        paper_id,
        archive_name: archive.name.to_string(),
        version: update.version,
        title: collapse_whitespace(&metadata.title),
        r#abstract: metadata.r#abstract.trim().to_string(),
        submitted_date: metadata.created.date(),
        updated_date: update.date,
        comments: non_empty(metadata.comments.as_deref()),
        journal_ref: non_empty(metadata.journal_ref.as_deref()),
        doi: non_empty(metadata.doi.as_deref()),
        formats: derive_formats(
            metadata.source_format.as_deref(),
            metadata.source_flags.as_deref(),
        ),
        authors,
        primary_category,
        secondary_categories,
        arxiv_id,
    })
}

fn lookup_category(paper_id: &str, code: &str) -> Result<Category, AssemblyError> {
    taxonomy()
        .category(code)
        .map(|info| Category {
            id: info.id.to_string(),
            name: info.name.to_string(),
        })
        .ok_or_else(|| AssemblyError::UnknownCategory {
            paper_id: paper_id.to_string(),
            code: code.to_string(),
        })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Formats offered for a submission, from its source type and flags.
///
/// Source flag `S` marks an encrypted source, which hides the `Other` formats
/// listing. Unrecognised source types yield no formats.
pub fn derive_formats(source_format: Option<&str>, source_flags: Option<&str>) -> Vec<Format> {
    let source_format = source_format.map(str::trim).unwrap_or_default();
    let mut formats = match source_format.to_ascii_lowercase().as_str() {
        "" | "tex" => vec![Format::Pdf, Format::Ps, Format::Other],
        "pdftex" | "docx" | "odf" => vec![Format::Pdf, Format::Other],
        "pdf" => vec![Format::Pdf],
        "ps" => vec![Format::Pdf, Format::Ps],
        "html" => vec![Format::Html],
        _ => Vec::new(),
    };

    if source_flags.is_some_and(|flags| flags.contains('S')) {
        formats.retain(|f| *f != Format::Other);
    }
    formats
}

// ============================================================================
// Author Parsing
// ============================================================================

/// Parses a delimited author string such as
/// `"A. Author (Inst One; Inst Two), B. Author and C. Author"`.
///
/// Authors are separated by `,`, `;` or the word `and` outside parentheses.
/// An empty string yields no authors.
pub fn parse_authors(raw: &str) -> Result<Vec<Author>, AuthorParseError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut authors = Vec::new();
    for (index, group) in split_groups(raw)?.iter().enumerate() {
        let mut parts = split_on_and(group);
        // Oxford comma: "A, B, and C" leaves a leading empty part
        if index > 0 && parts.len() > 1 && parts[0].is_empty() {
            parts.remove(0);
        }
        for part in parts {
            authors.push(parse_author(&part, authors.len() + 1)?);
        }
    }
    Ok(authors)
}

/// Splits on top-level `,` and `;`.
fn split_groups(raw: &str) -> Result<Vec<String>, AuthorParseError> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in raw.chars() {
        match ch {
            '(' => {
                if depth > 0 {
                    return Err(AuthorParseError::NestedParentheses);
                }
                depth += 1;
                current.push(ch);
            }
            ')' => {
                if depth == 0 {
                    return Err(AuthorParseError::UnbalancedParentheses);
                }
                depth -= 1;
                current.push(ch);
            }
            ',' | ';' if depth == 0 => groups.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    if depth != 0 {
        return Err(AuthorParseError::UnbalancedParentheses);
    }
    groups.push(current);
    Ok(groups)
}

/// Splits a group on the word `and` outside parentheses, normalizing whitespace.
fn split_on_and(group: &str) -> Vec<String> {
    let mut parts = vec![String::new()];
    let mut in_parens = false;

    for word in group.split_whitespace() {
        if !in_parens && word == "and" {
            parts.push(String::new());
            continue;
        }
        if word.contains('(') {
            in_parens = true;
        }
        if word.contains(')') {
            in_parens = false;
        }
        if let Some(last) = parts.last_mut() {
            if !last.is_empty() {
                last.push(' ');
            }
            last.push_str(word);
        }
    }
    parts
}

fn parse_author(group: &str, position: usize) -> Result<Author, AuthorParseError> {
    let (name, affiliations) = match group.split_once('(') {
        Some((name, rest)) => {
            let name = name.trim();
            let (inside, after) = rest
                .split_once(')')
                .ok_or(AuthorParseError::UnbalancedParentheses)?;
            if !after.trim().is_empty() {
                return Err(AuthorParseError::TrailingText(name.to_string()));
            }
            let affiliations = inside
                .split([';', ','])
                .map(str::trim)
                .map(|a| {
                    if a.is_empty() {
                        Err(AuthorParseError::EmptyAffiliation(name.to_string()))
                    } else {
                        Ok(a.to_string())
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            (name, affiliations)
        }
        None => (group.trim(), Vec::new()),
    };

    let tokens: Vec<&str> = name.split_whitespace().collect();
    let last_index = match tokens.as_slice() {
        [] => return Err(AuthorParseError::EmptyName(position)),
        [.., last] if tokens.len() > 1 && NAME_SUFFIXES.contains(last) => tokens.len() - 2,
        _ => tokens.len() - 1,
    };

    let initials = tokens[..last_index]
        .iter()
        .map(|token| initial_of(token))
        .filter(|initial| !initial.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Author {
        last_name: tokens[last_index].to_string(),
        full_name: tokens.join(" "),
        initials,
        affiliations,
    })
}

/// `Jean-Paul` -> `J.-P.`, `L` -> `L.`, `K.` -> `K.`
fn initial_of(token: &str) -> String {
    token
        .split('-')
        .filter_map(|piece| piece.chars().find(|c| c.is_alphabetic()))
        .map(|c| format!("{c}."))
        .collect::<Vec<_>>()
        .join("-")
}
