//! Record the processing outcome for a response.

use serde::Serialize;
use std::path::PathBuf;

use super::open_existing_store;
use crate::error::Result;
use crate::model::ScanStatus;

#[derive(Serialize)]
struct MarkOutput<'a> {
    id: &'a str,
    status: ScanStatus,
}

/// Execute the mark command.
///
/// # Errors
///
/// Returns `InvalidArgument` for a non-terminal status and
/// `ResponseNotFound` for an unknown id.
pub fn execute(
    db_path: Option<&PathBuf>,
    id: &str,
    status: &str,
    error: Option<&str>,
    json: bool,
) -> Result<()> {
    let status: ScanStatus = status.parse()?;

    let mut store = open_existing_store(db_path)?;
    store.mark_processed(id, status, error)?;

    if json {
        println!("{}", serde_json::to_string(&MarkOutput { id, status })?);
    } else {
        println!("Marked {id} as {status}");
    }

    Ok(())
}
