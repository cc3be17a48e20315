//! Run the poll loop.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use super::open_existing_store;
use crate::config::QualtricsConfig;
use crate::error::Result;
use crate::extract::ZipCsvExtractor;
use crate::poller::{Poller, PollerConfig};
use crate::qualtrics::QualtricsClient;

/// Execute the run command.
///
/// With `--once`, drives a single poll cycle and prints its report.
/// Otherwise runs cycles until Ctrl-C.
///
/// # Errors
///
/// Returns a configuration error before the loop starts if credentials
/// are missing; in `--once` mode, also propagates the cycle's failure.
pub fn execute(
    db_path: Option<&PathBuf>,
    once: bool,
    interval_secs: u64,
    export_deadline_secs: u64,
    json: bool,
) -> Result<()> {
    let config = QualtricsConfig::from_env()?;
    let client = QualtricsClient::new(config)?;
    let store = open_existing_store(db_path)?;

    let poller_config = PollerConfig {
        cycle_interval: Duration::from_secs(interval_secs),
        export_deadline: Duration::from_secs(export_deadline_secs),
        ..PollerConfig::default()
    };
    let mut poller = Poller::new(client, ZipCsvExtractor, store, poller_config);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        if once {
            let report = poller.run_once().await?;
            if json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!("Cycle complete");
                println!("  Rows extracted: {}", report.rows);
                println!("  Stored:         {}", report.accepted);
                println!("  Skipped:        {}", report.skipped);
                println!("  Total:          {} ({:+})", report.count_after, report.delta());
            }
            return Ok(());
        }

        info!(interval_secs, "Starting poll loop (Ctrl-C to stop)");
        tokio::select! {
            () = poller.run_forever() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
            }
        }
        Ok(())
    })
}
