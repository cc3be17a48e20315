//! Command handler implementations.

pub mod completions;
pub mod init;
pub mod mark;
pub mod pending;
pub mod run;
pub mod status;
pub mod version;
pub mod webhook;

use std::path::PathBuf;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::ResponseStore;

/// Resolve the database path and open the store, requiring that `init`
/// already ran.
fn open_existing_store(db_path: Option<&PathBuf>) -> Result<ResponseStore> {
    let path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;
    if !path.exists() {
        return Err(Error::NotInitialized);
    }
    ResponseStore::open(&path)
}

/// Resolve the database path without requiring it to exist yet.
fn resolve_required_db_path(db_path: Option<&PathBuf>) -> Result<PathBuf> {
    resolve_db_path(db_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("could not determine a database location".to_string()))
}
