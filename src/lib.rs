//! Atom and RSS feeds of newly announced arXiv e-prints.
//!
//! A request names archives and categories with a specifier such as
//! `cs.CV+math`. [`service::FeedService`] validates it, reads the matching
//! announcements from the SQLite store, assembles [`domain::Document`]s and
//! serializes them with the arXiv feed extensions.
//!
//! ```ignore
//! let db = Database::open("announcements.db").await?;
//! let service = FeedService::new(db, Config::load(&path)?);
//! let day = chrono::Utc::now().date_naive();
//! let xml = service
//!     .build_feed(&FeedRequest::for_day("cs.AI", FeedFormat::Atom, day))
//!     .await?;
//! ```

pub mod assembler;
pub mod cache;
pub mod config;
pub mod domain;
pub mod feed;
pub mod service;
pub mod specifier;
pub mod storage;
pub mod taxonomy;
pub mod util;
