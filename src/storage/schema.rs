//! Database schema definition.
//!
//! Timestamps are stored as INTEGER Unix milliseconds. `scan_status` holds
//! the wire strings of [`crate::model::ScanStatus`] and defaults to `NEW`
//! so every inserted row starts out as pending work.

use rusqlite::{Connection, Result};

/// The complete SQL schema for the response database.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS responses (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    scan_status TEXT NOT NULL DEFAULT 'NEW',
    scanned_at INTEGER,
    scan_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_responses_status ON responses(scan_status);
CREATE INDEX IF NOT EXISTS idx_responses_status_updated
    ON responses(scan_status, updated_at);
";

/// Apply the schema to a connection. Idempotent; safe on every open.
///
/// # Errors
///
/// Returns an error if the DDL fails to execute.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
