//! Wire types for the export-responses API.

use serde::Deserialize;

/// Envelope for `POST /export-responses/`.
#[derive(Debug, Deserialize)]
pub struct StartExportResponse {
    pub result: StartExportResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExportResult {
    pub progress_id: String,
}

/// Envelope for `GET /export-responses/{progressId}`.
#[derive(Debug, Deserialize)]
pub struct ExportStatusResponse {
    pub result: ExportProgress,
}

/// Progress descriptor of an export job at a point in time.
///
/// `percent_complete` is monotonically non-decreasing but not guaranteed
/// strictly increasing between polls. `file_id` is present only once the
/// job reports 100%, which is the sole terminal condition.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    pub percent_complete: f64,
    #[serde(default)]
    pub file_id: Option<String>,
}

impl ExportProgress {
    /// Pure termination predicate for the status poll loop.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percent_complete >= 100.0
    }
}

/// Envelope for `GET /responses/{responseId}` (webhook fetch path).
#[derive(Debug, Deserialize)]
pub struct SingleResponseEnvelope {
    pub result: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_parses_without_file_id() {
        let progress: ExportProgress =
            serde_json::from_str(r#"{"percentComplete": 37.5}"#).unwrap();
        assert!(!progress.is_complete());
        assert!(progress.file_id.is_none());
    }

    #[test]
    fn progress_parses_terminal_descriptor() {
        let progress: ExportProgress =
            serde_json::from_str(r#"{"percentComplete": 100.0, "fileId": "file-1"}"#).unwrap();
        assert!(progress.is_complete());
        assert_eq!(progress.file_id.as_deref(), Some("file-1"));
    }

    #[test]
    fn start_envelope_parses_progress_id() {
        let parsed: StartExportResponse =
            serde_json::from_str(r#"{"result": {"progressId": "ES_abc"}}"#).unwrap();
        assert_eq!(parsed.result.progress_id, "ES_abc");
    }
}
