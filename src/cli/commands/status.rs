//! Show database totals.

use serde::Serialize;
use std::path::PathBuf;

use super::open_existing_store;
use crate::error::Result;

#[derive(Serialize)]
struct StatusOutput {
    total: usize,
    pending: usize,
    processed: usize,
}

/// Execute the status command.
///
/// # Errors
///
/// Returns `NotInitialized` if the database does not exist.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_existing_store(db_path)?;
    let total = store.count()?;
    let pending = store.pending_count()?;

    let output = StatusOutput { total, pending, processed: total - pending };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Response database");
        println!("  Total:     {}", output.total);
        println!("  Pending:   {}", output.pending);
        println!("  Processed: {}", output.processed);
    }

    Ok(())
}
