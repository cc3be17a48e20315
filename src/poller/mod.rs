//! The poll loop: export, wait, download, extract, persist.
//!
//! One cycle is ever active; the suspension points are the status-poll
//! sleep and the inter-cycle sleep. A cycle that fails at any stage is
//! logged with the stage reached and retried from scratch on the next
//! cycle; `upsert` idempotency makes the re-submission harmless. Rows
//! committed before a mid-batch failure stay committed.

use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::extract::ResponseExtractor;
use crate::model::is_response_id;
use crate::qualtrics::ExportApi;
use crate::storage::ResponseStore;

/// Timing knobs for the poll loop, with production defaults.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Sleep between full cycles.
    pub cycle_interval: Duration,
    /// Sleep between status checks while an export job is running.
    pub status_interval: Duration,
    /// Wall-clock budget for one export job, measured from cycle start.
    pub export_deadline: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(60),
            status_interval: Duration::from_secs(2),
            export_deadline: Duration::from_secs(600),
        }
    }
}

/// Stage a cycle has reached, attached to failure logs for diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleStage {
    ExportStarted,
    Polling,
    Downloading,
    Extracting,
    Persisting,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExportStarted => "export-started",
            Self::Polling => "polling",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CycleReport {
    /// Rows the extractor produced, including non-response header rows.
    pub rows: usize,
    /// Rows that passed the id filter and were upserted.
    pub accepted: usize,
    /// Rows the id filter rejected.
    pub skipped: usize,
    pub count_before: usize,
    pub count_after: usize,
}

impl CycleReport {
    /// Net new rows this cycle. Zero when the snapshot only updated
    /// existing responses.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn delta(&self) -> i64 {
        self.count_after as i64 - self.count_before as i64
    }
}

/// Drives poll cycles end-to-end against an export API, an extractor and
/// the response store. All collaborators are explicit handles.
pub struct Poller<C, E> {
    client: C,
    extractor: E,
    store: ResponseStore,
    config: PollerConfig,
}

impl<C: ExportApi, E: ResponseExtractor> Poller<C, E> {
    pub fn new(client: C, extractor: E, store: ResponseStore, config: PollerConfig) -> Self {
        Self { client, extractor, store, config }
    }

    /// Read access to the store, for reporting after a run.
    #[must_use]
    pub fn store(&self) -> &ResponseStore {
        &self.store
    }

    /// Run one poll cycle end-to-end.
    ///
    /// # Errors
    ///
    /// Any stage failure aborts the cycle; the error is logged here with
    /// the stage reached and propagated to the caller.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        let mut stage = CycleStage::ExportStarted;
        match self.cycle(&mut stage).await {
            Ok(report) => {
                info!(
                    rows = report.rows,
                    accepted = report.accepted,
                    skipped = report.skipped,
                    total = report.count_after,
                    delta = report.delta(),
                    "Poll cycle complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(stage = %stage, error = %e, "Poll cycle failed");
                Err(e)
            }
        }
    }

    /// Run cycles forever with a fixed inter-cycle delay.
    ///
    /// Every cycle failure is contained here; nothing short of process
    /// termination stops the loop.
    pub async fn run_forever(&mut self) {
        loop {
            // run_once already logged any failure with its stage
            let _ = self.run_once().await;

            debug!(secs = self.config.cycle_interval.as_secs(), "Waiting until next cycle");
            sleep(self.config.cycle_interval).await;
        }
    }

    async fn cycle(&mut self, stage: &mut CycleStage) -> Result<CycleReport> {
        info!("Poll cycle started");
        let progress_id = self.client.start_export().await?;
        info!(progress_id = %progress_id, "Export job started");

        *stage = CycleStage::Polling;
        let file_id = self.wait_for_file(&progress_id).await?;

        *stage = CycleStage::Downloading;
        let archive = self.client.download(&file_id).await?;
        debug!(bytes = archive.len(), "Export archive downloaded");

        *stage = CycleStage::Extracting;
        let rows = self.extractor.extract(&archive)?;
        info!(rows = rows.len(), "Rows extracted from archive");

        *stage = CycleStage::Persisting;
        let count_before = self.store.count()?;
        let mut accepted = 0;
        let mut skipped = 0;
        for row in &rows {
            if is_response_id(&row.id) {
                self.store.upsert(&row.id, &row.payload)?;
                accepted += 1;
            } else {
                debug!(id = %row.id, "Skipping row without a response id");
                skipped += 1;
            }
        }
        let count_after = self.store.count()?;

        Ok(CycleReport { rows: rows.len(), accepted, skipped, count_before, count_after })
    }

    /// Poll the export job until it is terminal or the deadline passes.
    ///
    /// Termination is a pure predicate over the progress descriptor; the
    /// deadline is evaluated separately after each non-terminal reading,
    /// so the download is never attempted for an expired job.
    async fn wait_for_file(&self, progress_id: &str) -> Result<String> {
        let deadline = Instant::now() + self.config.export_deadline;

        loop {
            let progress = self.client.poll_status(progress_id).await?;
            info!(percent = progress.percent_complete, "Export progress");

            if progress.is_complete() {
                return progress.file_id.ok_or_else(|| {
                    Error::Transport("export reported complete without a file id".into())
                });
            }

            if Instant::now() >= deadline {
                return Err(Error::ExportTimeout {
                    deadline_secs: self.config.export_deadline.as_secs(),
                });
            }

            sleep(self.config.status_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedRow;
    use crate::model::ScanStatus;
    use crate::qualtrics::ExportProgress;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Export API mock that replays a scripted sequence of progress
    /// descriptors, repeating the last one once the script runs out.
    struct ScriptedClient {
        statuses: Mutex<VecDeque<ExportProgress>>,
        polls: AtomicUsize,
        downloads: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(percents: &[(f64, Option<&str>)]) -> Self {
            let statuses = percents
                .iter()
                .map(|(percent, file_id)| ExportProgress {
                    percent_complete: *percent,
                    file_id: file_id.map(ToString::to_string),
                })
                .collect();
            Self {
                statuses: Mutex::new(statuses),
                polls: AtomicUsize::new(0),
                downloads: AtomicUsize::new(0),
            }
        }

        fn poll_count(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }

        fn download_count(&self) -> usize {
            self.downloads.load(Ordering::SeqCst)
        }
    }

    impl ExportApi for &ScriptedClient {
        async fn start_export(&self) -> Result<String> {
            Ok("ES_test".to_string())
        }

        async fn poll_status(&self, _progress_id: &str) -> Result<ExportProgress> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.pop_front().unwrap())
            } else {
                Ok(statuses.front().cloned().expect("script must not be empty"))
            }
        }

        async fn download(&self, _file_id: &str) -> Result<Vec<u8>> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    /// Extractor stub that ignores the archive bytes.
    struct StubExtractor(Vec<ExtractedRow>);

    impl ResponseExtractor for StubExtractor {
        fn extract(&self, _archive: &[u8]) -> Result<Vec<ExtractedRow>> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    impl ResponseExtractor for FailingExtractor {
        fn extract(&self, _archive: &[u8]) -> Result<Vec<ExtractedRow>> {
            Err(Error::Data("no CSV member in export archive".into()))
        }
    }

    fn fast_config() -> PollerConfig {
        PollerConfig {
            cycle_interval: Duration::from_millis(1),
            status_interval: Duration::from_millis(1),
            export_deadline: Duration::from_secs(5),
        }
    }

    fn row(id: &str) -> ExtractedRow {
        ExtractedRow { id: id.to_string(), payload: format!(r#"{{"ResponseId":"{id}"}}"#) }
    }

    #[tokio::test]
    async fn downloads_exactly_once_after_terminal_reading() {
        let client = ScriptedClient::new(&[(30.0, None), (60.0, None), (100.0, Some("file-1"))]);
        let mut poller = Poller::new(
            &client,
            StubExtractor(vec![row("R_1")]),
            ResponseStore::open_memory().unwrap(),
            fast_config(),
        );

        let report = poller.run_once().await.unwrap();

        assert_eq!(client.poll_count(), 3);
        assert_eq!(client.download_count(), 1);
        assert_eq!(report.accepted, 1);
    }

    #[tokio::test]
    async fn deadline_fails_cycle_without_downloading() {
        let client = ScriptedClient::new(&[(50.0, None)]);
        let config = PollerConfig {
            export_deadline: Duration::from_millis(20),
            status_interval: Duration::from_millis(1),
            ..fast_config()
        };
        let mut poller = Poller::new(
            &client,
            StubExtractor(vec![]),
            ResponseStore::open_memory().unwrap(),
            config,
        );

        let err = poller.run_once().await.unwrap_err();

        assert!(matches!(err, Error::ExportTimeout { .. }));
        assert_eq!(client.download_count(), 0);
    }

    #[tokio::test]
    async fn terminal_reading_without_file_id_is_a_transport_error() {
        let client = ScriptedClient::new(&[(100.0, None)]);
        let mut poller = Poller::new(
            &client,
            StubExtractor(vec![]),
            ResponseStore::open_memory().unwrap(),
            fast_config(),
        );

        let err = poller.run_once().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(client.download_count(), 0);
    }

    #[tokio::test]
    async fn id_filter_keeps_header_rows_out_of_the_store() {
        let client = ScriptedClient::new(&[(100.0, Some("file-1"))]);
        let mut poller = Poller::new(
            &client,
            StubExtractor(vec![row("R_9"), row("X_9"), row("Response ID")]),
            ResponseStore::open_memory().unwrap(),
            fast_config(),
        );

        let report = poller.run_once().await.unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(report.skipped, 2);
        assert!(poller.store().get("R_9").unwrap().is_some());
        assert!(poller.store().get("X_9").unwrap().is_none());
    }

    #[tokio::test]
    async fn report_delta_is_zero_for_update_only_cycles() {
        let client = ScriptedClient::new(&[(100.0, Some("file-1"))]);
        let mut store = ResponseStore::open_memory().unwrap();
        store.upsert("R_1", r#"{"ResponseId":"R_1"}"#).unwrap();
        store.mark_processed("R_1", ScanStatus::Done, None).unwrap();

        let mut poller = Poller::new(&client, StubExtractor(vec![row("R_1")]), store, fast_config());
        let report = poller.run_once().await.unwrap();

        assert_eq!(report.delta(), 0);
        assert_eq!(report.accepted, 1);
        // Unchanged resubmission leaves the processed status alone
        assert_eq!(
            poller.store().get("R_1").unwrap().unwrap().status,
            ScanStatus::Done
        );
    }

    #[tokio::test]
    async fn extractor_failure_aborts_cycle_before_any_write() {
        let client = ScriptedClient::new(&[(100.0, Some("file-1"))]);
        let mut poller = Poller::new(
            &client,
            FailingExtractor,
            ResponseStore::open_memory().unwrap(),
            fast_config(),
        );

        let err = poller.run_once().await.unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert_eq!(poller.store().count().unwrap(), 0);
    }
}
