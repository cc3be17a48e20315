//! Create the response database.

use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use super::resolve_required_db_path;
use crate::error::{Error, Result};
use crate::storage::ResponseStore;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
}

/// Execute the init command.
///
/// Creates the database file with its schema applied, plus any missing
/// parent directories.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `--force` was
/// not given, or an error if the file cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let path = resolve_required_db_path(db_path)?;

    if path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized { path });
        }
        fs::remove_file(&path)?;
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Opening applies the schema
    let store = ResponseStore::open(&path)?;
    drop(store);

    if json {
        let output = InitOutput { database: path };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized response database");
        println!("  Database: {}", path.display());
        println!();
        println!("Next: set QUALTRICS_API_TOKEN, QUALTRICS_DATA_CENTER and");
        println!("QUALTRICS_SURVEY_ID, then start `qsync run`.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_database_with_schema() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("nested").join("responses.db");

        execute(Some(&db), false, true).unwrap();

        assert!(db.exists());
        let store = ResponseStore::open(&db).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("responses.db");

        execute(Some(&db), false, true).unwrap();
        let err = execute(Some(&db), false, true).unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized { .. }));
    }

    #[test]
    fn init_force_recreates_database() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("responses.db");

        execute(Some(&db), false, true).unwrap();
        {
            let mut store = ResponseStore::open(&db).unwrap();
            store.upsert("R_1", "{}").unwrap();
        }

        execute(Some(&db), true, true).unwrap();
        let store = ResponseStore::open(&db).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
