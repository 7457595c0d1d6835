//! Feed generation for arXiv announcements.
//!
//! - [`tree`] - mutable XML element tree and its quick-xml writer
//! - [`builder`] - generic Atom/RSS builder with feed and entry extension hooks
//! - [`extension`] - the arXiv namespaces and per-entry arXiv fields
//!
//! # Example
//!
//! ```ignore
//! use arxiv_feed::feed::{ArxivEntryExtension, ExtensionScope, FeedBuilder, FeedEntry};
//!
//! let mut entry = FeedEntry::new(id, title, link, updated);
//! let mut ext = ArxivEntryExtension::new("arxiv.org");
//! ext.set_comment("10 pages");
//! entry.register_extension(ext, ExtensionScope::Both);
//! builder.add_entry(entry);
//! let xml = builder.atom_str()?;
//! ```

mod builder;
mod extension;
mod tree;

pub use builder::{
    EntryExtension, ExtensionScope, FeedBuilder, FeedEntry, FeedExtension, FeedFormat, ATOM_NS,
};
pub use extension::{
    ArxivAtomExtension, ArxivEntryExtension, ArxivExtension, ADMIN_NS, ARXIV_NS, CONTENT_NS,
    MEDIA_NS, SYN_NS, TAXO_NS,
};
pub use tree::{write_document, Element, Namespaces, RenderError};
