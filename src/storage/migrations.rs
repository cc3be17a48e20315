//! Column backfill for databases created by the first-generation pipeline.
//!
//! Early deployments stored only `id`, `payload`, `created_at` and
//! `updated_at`; the scan columns arrived later. `CREATE TABLE IF NOT
//! EXISTS` leaves such tables alone, so missing columns are added here
//! with `ALTER TABLE` on every open. Idempotent.

use rusqlite::{Connection, Result};
use std::collections::HashSet;
use tracing::info;

/// Columns added after the initial schema, with their ALTER statements.
const BACKFILL_COLUMNS: &[(&str, &str)] = &[
    (
        "scan_status",
        "ALTER TABLE responses ADD COLUMN scan_status TEXT NOT NULL DEFAULT 'NEW'",
    ),
    ("scanned_at", "ALTER TABLE responses ADD COLUMN scanned_at INTEGER"),
    ("scan_error", "ALTER TABLE responses ADD COLUMN scan_error TEXT"),
];

/// Add any missing scan columns to the `responses` table.
///
/// # Errors
///
/// Returns an error if the PRAGMA or an ALTER statement fails.
pub fn add_missing_columns(conn: &Connection) -> Result<()> {
    let existing: HashSet<String> = conn
        .prepare("PRAGMA table_info(responses)")?
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;

    for (column, ddl) in BACKFILL_COLUMNS {
        if !existing.contains(*column) {
            info!(column, "Adding missing column to responses table");
            conn.execute(ddl, [])?;
        }
    }

    Ok(())
}
