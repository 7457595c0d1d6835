//! SQLite store of announcement events and e-print metadata.
//!
//! Feed code only consumes query results through
//! [`Database::get_announce_papers`]; the loading helpers exist for importers
//! and test fixtures.

mod announce;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, MetadataRow, QueryLimits, UpdateAction, UpdateRow};
