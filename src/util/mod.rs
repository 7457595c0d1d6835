//! Utility functions for common operations.
//!
//! - **Host validation**: checks configured server names before they are
//!   interpolated into feed links
//! - **Text sanitizing**: removes characters XML 1.0 cannot carry

mod host;
mod text;

pub use host::{validate_host, HostValidationError};
pub use text::strip_invalid_xml_chars;
