//! Serve the webhook listener.

use std::path::PathBuf;
use std::sync::Arc;

use super::open_existing_store;
use crate::config::QualtricsConfig;
use crate::error::Result;
use crate::qualtrics::QualtricsClient;
use crate::webhook::{self, WebhookState};

/// Execute the webhook command.
///
/// Blocks until Ctrl-C.
///
/// # Errors
///
/// Returns a configuration error if credentials are missing, or an I/O
/// error if the port cannot be bound.
pub fn execute(db_path: Option<&PathBuf>, port: u16) -> Result<()> {
    let config = QualtricsConfig::from_env()?;
    let client = QualtricsClient::new(config)?;
    let store = open_existing_store(db_path)?;

    let state = Arc::new(WebhookState::new(client, store));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(webhook::serve(state, port))
}
