//! Qualtrics survey export API.
//!
//! The remote protocol is a three-step asynchronous export job: start a
//! job, poll its progress descriptor until it reports 100%, then download
//! the resulting archive. Each client method performs exactly one network
//! round trip; retry across calls belongs to the poll loop, not here.

mod client;
mod types;

pub use client::QualtricsClient;
pub use types::ExportProgress;

use crate::error::Result;

/// Seam between the poll cycle and the remote export protocol.
///
/// Implemented by [`QualtricsClient`] in production and by mocks in the
/// poller tests.
pub trait ExportApi {
    /// Start an export job, returning its progress id.
    fn start_export(&self) -> impl Future<Output = Result<String>> + Send;

    /// Check an export job once.
    fn poll_status(&self, progress_id: &str) -> impl Future<Output = Result<ExportProgress>> + Send;

    /// Download the completed archive.
    fn download(&self, file_id: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
