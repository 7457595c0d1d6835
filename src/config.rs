//! Configuration file parser.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos. The `BASE_SERVER` environment variable takes precedence over
//! the file's `base_server`.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::storage::QueryLimits;
use crate::util::{validate_host, HostValidationError};

/// Environment variable overriding `base_server`.
pub const BASE_SERVER_ENV: &str = "BASE_SERVER";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid base_server '{value}': {source}")]
    InvalidBaseServer {
        value: String,
        #[source]
        source: HostValidationError,
    },

    #[error("Invalid {key} = {value}: must be at least 1")]
    InvalidLimit { key: &'static str, value: i64 },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Feed generation settings.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bare host used in entry links, media URLs and author search links.
    pub base_server: String,

    /// Maximum number of announcements per feed.
    pub result_limit: i64,

    /// `replace` announcements are only listed up to this version.
    pub replace_version_threshold: i64,

    /// Number of rendered feeds kept in memory. 0 disables caching.
    pub cache_capacity: usize,

    /// Seconds a rendered feed is served from memory before it is rebuilt.
    /// 0 disables caching.
    pub cache_ttl_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        let limits = QueryLimits::default();
        Self {
            base_server: "arxiv.org".to_string(),
            result_limit: limits.result_limit,
            replace_version_threshold: limits.replace_version_threshold,
            cache_capacity: 64,
            cache_ttl_seconds: 300,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "base_server",
        "result_limit",
        "replace_version_threshold",
        "cache_capacity",
        "cache_ttl_seconds",
    ];

    /// Load configuration from a TOML file, then apply `BASE_SERVER`.
    ///
    /// - Missing or empty file → defaults
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - `base_server` that is not a bare host → `Err(ConfigError::InvalidBaseServer)`
    /// - `result_limit` or `replace_version_threshold` below 1 → `Err(ConfigError::InvalidLimit)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_file(path)?;
        config.with_base_server_override(std::env::var(BASE_SERVER_ENV).ok())
    }

    /// Defaults with only the environment override applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_base_server_override(std::env::var(BASE_SERVER_ENV).ok())
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        // Check the size before reading so a huge file is never loaded.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parses TOML text; empty text yields defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        tracing::info!(
            base_server = %config.base_server,
            result_limit = config.result_limit,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Replaces `base_server` when `value` is set and non-blank.
    pub fn with_base_server_override(mut self, value: Option<String>) -> Result<Self, ConfigError> {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            tracing::debug!(base_server = %value, "Using base server from environment");
            self.base_server = value.trim().to_string();
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_host(&self.base_server).map_err(|source| ConfigError::InvalidBaseServer {
            value: self.base_server.clone(),
            source,
        })?;

        // SQLite treats a negative LIMIT as no limit at all.
        for (key, value) in [
            ("result_limit", self.result_limit),
            ("replace_version_threshold", self.replace_version_threshold),
        ] {
            if value < 1 {
                return Err(ConfigError::InvalidLimit { key, value });
            }
        }
        Ok(())
    }

    /// Query limits derived from this configuration.
    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            result_limit: self.result_limit,
            replace_version_threshold: self.replace_version_threshold,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
