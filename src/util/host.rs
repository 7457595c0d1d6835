use thiserror::Error;
use url::{Host, Url};

/// Errors that can occur while validating a server host name.
#[derive(Error, Debug)]
pub enum HostValidationError {
    /// The host could not be parsed.
    #[error("Invalid host: {0}")]
    InvalidHost(#[from] url::ParseError),
    /// The value contains a scheme, path, query or credentials.
    #[error("Expected a bare host name (optionally with port), got '{0}'")]
    NotBare(String),
}

/// Validates a bare `host[:port]` value used to build absolute links.
///
/// # Examples
///
/// ```
/// use arxiv_feed::util::validate_host;
///
/// assert!(validate_host("arxiv.org").is_ok());
/// assert!(validate_host("localhost:8080").is_ok());
/// assert!(validate_host("https://arxiv.org/").is_err());
/// ```
pub fn validate_host(host: &str) -> Result<Host, HostValidationError> {
    let trimmed = host.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '?', '#', '@']) {
        return Err(HostValidationError::NotBare(host.to_owned()));
    }

    let url = Url::parse(&format!("http://{trimmed}/"))?;
    url.host()
        .map(|h| h.to_owned())
        .ok_or_else(|| HostValidationError::NotBare(host.to_owned()))
}
