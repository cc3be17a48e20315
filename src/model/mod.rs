//! Domain types for synced survey responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Processing status of a stored response.
///
/// The status column doubles as the pending-work queue: `New` means a
/// downstream consumer still has to (re)process the response, `Done` and
/// `Error` are terminal until the payload changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    New,
    Done,
    Error,
}

impl ScanStatus {
    /// Wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::New => "NEW",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        }
    }

    /// Terminal statuses are the only valid targets for `mark_processed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEW" => Ok(Self::New),
            "DONE" => Ok(Self::Done),
            "ERROR" => Ok(Self::Error),
            other => Err(Error::InvalidArgument(format!(
                "invalid scan status '{other}' (expected new, done or error)"
            ))),
        }
    }
}

/// One survey response, keyed by the platform-assigned response id.
///
/// `payload` is the latest known full snapshot of the answers, serialized
/// as a JSON object. `created_at` is set once; `updated_at` moves only
/// when the payload materially changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check whether a string looks like a Qualtrics response id.
///
/// Real response ids are `R_` followed by alphanumerics. The CSV export
/// carries two extra header rows (question text, import metadata) whose
/// first cell never matches, so this filter keeps them out of the store.
#[must_use]
pub fn is_response_id(id: &str) -> bool {
    id.strip_prefix("R_")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(char::is_alphanumeric))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_status_round_trips() {
        for status in [ScanStatus::New, ScanStatus::Done, ScanStatus::Error] {
            assert_eq!(status.as_str().parse::<ScanStatus>().unwrap(), status);
        }
    }

    #[test]
    fn scan_status_parse_is_case_insensitive() {
        assert_eq!("done".parse::<ScanStatus>().unwrap(), ScanStatus::Done);
        assert_eq!("Error".parse::<ScanStatus>().unwrap(), ScanStatus::Error);
    }

    #[test]
    fn scan_status_rejects_unknown() {
        assert!("pending".parse::<ScanStatus>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!ScanStatus::New.is_terminal());
        assert!(ScanStatus::Done.is_terminal());
        assert!(ScanStatus::Error.is_terminal());
    }

    #[test]
    fn accepts_real_response_ids() {
        assert!(is_response_id("R_1oXw9ZkpIbDEXmP"));
        assert!(is_response_id("R_9"));
    }

    #[test]
    fn rejects_non_response_rows() {
        // Question-text and ImportId header rows from a Qualtrics CSV
        assert!(!is_response_id("Response ID"));
        assert!(!is_response_id("{\"ImportId\":\"_recordId\"}"));
        assert!(!is_response_id("X_9"));
        assert!(!is_response_id("R_"));
        assert!(!is_response_id(""));
    }
}
