//! Parsing of feed specifiers such as `cs.CV+math+hep-lat`.
//!
//! A specifier is `token ('+' token)*` where each token is either a bare
//! archive (`math`) or `archive.subject` (`cs.CV`). Matching is
//! case-insensitive; returned codes use the taxonomy's canonical casing.

use thiserror::Error;

use crate::taxonomy::taxonomy;

/// Reasons a specifier is rejected. The messages are part of the public
/// contract and are shown to users verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecifierError {
    #[error("Invalid archive specification")]
    Empty,

    #[error("Bad archive/subject class structure")]
    Structure,

    #[error("Bad archive '{0}'.")]
    UnknownArchive(String),

    /// Also used when the subject class exists but not under the given archive.
    #[error("Bad subject class '{0}'.")]
    UnknownSubjectClass(String),
}

/// A validated specifier, partitioned into bare archives and dotted categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ArchiveCategorySpec {
    pub archives: Vec<String>,
    pub categories: Vec<String>,
}

impl ArchiveCategorySpec {
    /// Archives followed by categories, the query's effective scope.
    pub fn all_codes(&self) -> Vec<String> {
        self.archives
            .iter()
            .chain(self.categories.iter())
            .cloned()
            .collect()
    }

    /// Canonical `+`-joined form, archives first.
    pub fn to_specifier(&self) -> String {
        self.all_codes().join("+")
    }
}

/// Validates a specifier string.
///
/// # Errors
///
/// Returns the first [`SpecifierError`] encountered, scanning tokens left to right.
///
/// # Examples
///
/// ```
/// use arxiv_feed::specifier::validate;
///
/// let spec = validate("cs.CV+math").unwrap();
/// assert_eq!(spec.archives, vec!["math"]);
/// assert_eq!(spec.categories, vec!["cs.CV"]);
/// ```
pub fn validate(spec: &str) -> Result<ArchiveCategorySpec, SpecifierError> {
    if spec.trim().is_empty() {
        return Err(SpecifierError::Empty);
    }

    let tax = taxonomy();
    let mut result = ArchiveCategorySpec::default();

    for token in spec.split('+').map(str::trim) {
        if token.is_empty() {
            return Err(SpecifierError::Empty);
        }

        let parts: Vec<&str> = token.split('.').collect();
        let (archive, subject) = match parts.as_slice() {
            [archive] => (*archive, None),
            [archive, subject] => (*archive, Some(*subject)),
            _ => return Err(SpecifierError::Structure),
        };

        if archive.is_empty() {
            return match subject {
                Some(s) if !s.is_empty() => Err(SpecifierError::UnknownArchive(String::new())),
                _ => Err(SpecifierError::Structure),
            };
        }
        if subject.is_some_and(str::is_empty) {
            return Err(SpecifierError::Structure);
        }

        let archive_info = tax
            .archive(archive)
            .ok_or_else(|| SpecifierError::UnknownArchive(archive.to_string()))?;

        match subject {
            None => result.archives.push(archive_info.id.to_string()),
            Some(subject) => {
                let category = tax
                    .subject_in_archive(archive_info.id, subject)
                    .ok_or_else(|| SpecifierError::UnknownSubjectClass(subject.to_string()))?;
                result.categories.push(category.id.to_string());
            }
        }
    }

    tracing::debug!(
        archives = ?result.archives,
        categories = ?result.categories,
        "Validated feed specifier"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(archives: &[&str], categories: &[&str]) -> ArchiveCategorySpec {
        ArchiveCategorySpec {
            archives: archives.iter().map(|s| s.to_string()).collect(),
            categories: categories.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn message(input: &str) -> String {
        validate(input).unwrap_err().to_string()
    }

    #[test]
    fn test_empty_specifier_rejected() {
        assert_eq!(message("   "), "Invalid archive specification");
        assert_eq!(message(""), "Invalid archive specification");
        assert_eq!(message("cs.ai+"), "Invalid archive specification");
        assert_eq!(message("+math"), "Invalid archive specification");
    }

    #[test]
    fn test_categories_not_case_sensitive() {
        let expected = spec(&[], &["cs.AI"]);
        for input in ["cs.ai", "CS.ai", "cs.AI", "CS.AI"] {
            assert_eq!(validate(input).unwrap(), expected);
        }

        let expected = spec(&["physics"], &[]);
        assert_eq!(validate("physics").unwrap(), expected);
        assert_eq!(validate("PhYsiCs").unwrap(), expected);
    }

    #[test]
    fn test_separates_categories_and_archives_in_order() {
        assert_eq!(
            validate("cs.CV+math+hep-lat+cs.CG").unwrap(),
            spec(&["math", "hep-lat"], &["cs.CV", "cs.CG"])
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        assert_eq!(
            validate("math+MATH").unwrap(),
            spec(&["math", "math"], &[])
        );
    }

    #[test]
    fn test_bad_structure() {
        assert_eq!(message(".AI"), "Bad archive ''.");
        assert_eq!(message("....AI"), "Bad archive/subject class structure");
        assert_eq!(
            message("cs.AI.revolutionary"),
            "Bad archive/subject class structure"
        );
        assert_eq!(message("cs.AI."), "Bad archive/subject class structure");
        assert_eq!(message("cs."), "Bad archive/subject class structure");
        assert_eq!(message("."), "Bad archive/subject class structure");
    }

    #[test]
    fn test_unknown_archive() {
        for input in ["psuedo-science", "psuedo-science.CS", "cs.AI+psuedo-science"] {
            assert_eq!(message(input), "Bad archive 'psuedo-science'.");
        }
    }

    #[test]
    fn test_unknown_subject_class() {
        assert_eq!(
            message("physics.psuedo-science"),
            "Bad subject class 'psuedo-science'."
        );
        assert_eq!(
            message("cs.AI+physics.psuedo-science"),
            "Bad subject class 'psuedo-science'."
        );
    }

    #[test]
    fn test_subject_class_from_another_archive() {
        assert_eq!(
            validate("physics.AI").unwrap_err(),
            SpecifierError::UnknownSubjectClass("AI".to_string())
        );
    }

    #[test]
    fn test_first_error_wins() {
        assert_eq!(
            message("psuedo-science+physics.AI"),
            "Bad archive 'psuedo-science'."
        );
    }

    #[test]
    fn test_to_specifier() {
        let parsed = validate("cs.cv+MATH").unwrap();
        assert_eq!(parsed.to_specifier(), "math+cs.CV");
        assert_eq!(parsed.all_codes(), vec!["math", "cs.CV"]);
    }
}
