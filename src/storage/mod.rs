//! SQLite persistence for survey responses.
//!
//! The store is a single `responses` relation whose `scan_status` column
//! doubles as the pending-work queue for downstream consumers.

pub mod migrations;
pub mod schema;
mod sqlite;

pub use sqlite::ResponseStore;
