//! SQLite-backed response store.
//!
//! Owns an explicit connection handle; nothing in the crate touches the
//! database except through this type. Every operation is individually
//! atomic; a batch of upserts has no all-or-nothing guarantee, which is
//! acceptable because `upsert` is idempotent and the next poll cycle
//! re-submits the same rows.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{Response, ScanStatus};
use crate::storage::migrations::add_missing_columns;
use crate::storage::schema::apply_schema;

/// Change-aware upsert store for survey responses.
#[derive(Debug)]
pub struct ResponseStore {
    conn: Connection,
}

impl ResponseStore {
    /// Open a database at the given path.
    ///
    /// Creates the database, applies the schema and backfills legacy
    /// columns if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// schema fails to apply.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_schema(&conn)?;
        add_missing_columns(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        add_missing_columns(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Insert or update a response, with change detection.
    ///
    /// - Absent id: insert with `status = NEW`, `created_at = updated_at = now`.
    /// - Present, identical payload: the row is left entirely untouched,
    ///   including `updated_at` and any terminal status.
    /// - Present, different payload: `payload` and `updated_at` are
    ///   refreshed and the status is forced back to `NEW`, discarding a
    ///   prior `DONE`/`ERROR`. A materially changed response always
    ///   becomes pending work again.
    ///
    /// Idempotent under repeated identical calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn upsert(&mut self, id: &str, payload: &str) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO responses (id, payload, created_at, updated_at, scan_status)
             VALUES (?1, ?2, ?3, ?3, 'NEW')
             ON CONFLICT(id) DO UPDATE SET
                 payload = excluded.payload,
                 updated_at = excluded.updated_at,
                 scan_status = 'NEW'
             WHERE responses.payload != excluded.payload",
            params![id, payload, now],
        )?;
        Ok(())
    }

    /// Fetch up to `limit` pending responses, oldest-changed first.
    ///
    /// Ordering by `updated_at` ascending gives fairness across repeated
    /// partial drains: a row that changed earlier is never starved by
    /// later arrivals.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn fetch_pending(&self, limit: usize) -> Result<Vec<Response>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, payload, created_at, updated_at, scan_status, scanned_at, scan_error
             FROM responses
             WHERE scan_status = 'NEW'
             ORDER BY updated_at ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit], row_to_response)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Look up a single response by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get(&self, id: &str) -> Result<Option<Response>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, payload, created_at, updated_at, scan_status, scanned_at, scan_error
                 FROM responses WHERE id = ?1",
                [id],
                row_to_response,
            )
            .optional()?;
        Ok(row)
    }

    /// Mark a response as processed with a terminal status.
    ///
    /// Stamps `scanned_at` and stores (or clears) the error message.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a non-terminal status and
    /// `ResponseNotFound` if the id does not exist.
    pub fn mark_processed(
        &mut self,
        id: &str,
        status: ScanStatus,
        error: Option<&str>,
    ) -> Result<()> {
        if !status.is_terminal() {
            return Err(Error::InvalidArgument(format!(
                "status must be terminal (done or error), got '{status}'"
            )));
        }

        let now = Utc::now().timestamp_millis();
        let changed = self.conn.execute(
            "UPDATE responses
             SET scan_status = ?1, scanned_at = ?2, scan_error = ?3
             WHERE id = ?4",
            params![status.as_str(), now, error, id],
        )?;

        if changed == 0 {
            return Err(Error::ResponseNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Total number of stored responses.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Number of responses still pending downstream processing.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn pending_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE scan_status = 'NEW'",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<Response> {
    let status_str: String = row.get(4)?;
    let status = status_str.parse::<ScanStatus>().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown scan status '{status_str}'").into(),
        )
    })?;

    Ok(Response {
        id: row.get(0)?,
        payload: row.get(1)?,
        created_at: millis_to_datetime(row.get(2)?),
        updated_at: millis_to_datetime(row.get(3)?),
        status,
        scanned_at: row.get::<_, Option<i64>>(5)?.map(millis_to_datetime),
        error: row.get(6)?,
    })
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    // Timestamps written by this store are always in range.
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
