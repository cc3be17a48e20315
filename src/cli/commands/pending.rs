//! List responses awaiting downstream processing.

use colored::Colorize;
use std::path::PathBuf;

use super::open_existing_store;
use crate::error::Result;

/// Execute the pending command.
///
/// Lists up to `limit` pending responses, oldest-changed first, in the
/// same order a downstream worker would drain them.
///
/// # Errors
///
/// Returns `NotInitialized` if the database does not exist.
pub fn execute(db_path: Option<&PathBuf>, limit: usize, json: bool) -> Result<()> {
    let store = open_existing_store(db_path)?;
    let pending = store.fetch_pending(limit)?;

    if json {
        println!("{}", serde_json::to_string(&pending)?);
        return Ok(());
    }

    if pending.is_empty() {
        println!("No pending responses.");
        return Ok(());
    }

    println!("{} pending response(s):", pending.len());
    for response in &pending {
        println!(
            "  {}  updated {}",
            response.id.bold(),
            response.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}
