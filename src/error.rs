//! Error types for the Qualtrics sync pipeline.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=data, 5=transport, ...)
//! - Retryability flags: retryable errors abort one poll cycle and are
//!   picked up again on the next; non-retryable errors are fatal
//! - Recovery hints for operators
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for qualtrics-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string; shell pipelines on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ResponseNotFound,

    // Data / validation (exit 4)
    DataError,
    InvalidArgument,

    // Transport (exit 5)
    TransportError,

    // Export deadline (exit 6)
    ExportTimeout,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ResponseNotFound => "RESPONSE_NOT_FOUND",
            Self::DataError => "DATA_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::ExportTimeout => "EXPORT_TIMEOUT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ResponseNotFound => 3,
            Self::DataError | Self::InvalidArgument => 4,
            Self::TransportError => 5,
            Self::ExportTimeout => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the poll loop should swallow this error and retry the
    /// whole operation on the next cycle.
    ///
    /// True for transport, timeout, data, and store errors: one bad
    /// cycle never terminates the process. False for configuration
    /// errors, which abort before the loop starts.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransportError
                | Self::ExportTimeout
                | Self::DataError
                | Self::DatabaseError
                | Self::IoError
                | Self::JsonError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in qualtrics-sync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `qsync init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Response not found: {id}")]
    ResponseNotFound { id: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Export did not complete within {deadline_secs}s deadline")]
    ExportTimeout { deadline_secs: u64 },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // Per-request timeouts are transport failures; the export
        // deadline has its own variant.
        Self::Transport(e.to_string())
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::ResponseNotFound { .. } => ErrorCode::ResponseNotFound,
            Self::Transport(_) => ErrorCode::TransportError,
            Self::ExportTimeout { .. } => ErrorCode::ExportTimeout,
            Self::Data(_) => ErrorCode::DataError,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether the poll loop may contain this error and try again next cycle.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.error_code().is_retryable()
    }

    /// Context-aware recovery hint for operators.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `qsync init` to create the response database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::ResponseNotFound { id } => Some(format!(
                "No response with id '{id}'. Use `qsync pending` to list unprocessed responses."
            )),

            Self::Config(_) => Some(
                "Set QUALTRICS_API_TOKEN, QUALTRICS_DATA_CENTER and QUALTRICS_SURVEY_ID \
                 in the environment (or a .env file)."
                    .to_string(),
            ),

            Self::ExportTimeout { .. } => Some(
                "The export job never reached 100%. The next cycle starts a fresh export; \
                 raise --export-deadline if the survey is very large."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("status") {
                    Some("Valid terminal statuses: done, error".to_string())
                } else {
                    None
                }
            }

            Self::Transport(_)
            | Self::Data(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_errors_are_retryable() {
        assert!(Error::Transport("connection refused".into()).is_retryable());
        assert!(Error::ExportTimeout { deadline_secs: 600 }.is_retryable());
        assert!(Error::Data("no CSV in archive".into()).is_retryable());
    }

    #[test]
    fn config_errors_are_fatal() {
        let err = Error::Config("missing QUALTRICS_API_TOKEN".into());
        assert!(!err.is_retryable());
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn structured_json_includes_code_and_hint() {
        let err = Error::ResponseNotFound { id: "R_123".into() };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "RESPONSE_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert!(json["error"]["hint"].as_str().unwrap().contains("R_123"));
    }

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::Transport(String::new()).exit_code(), 5);
        assert_eq!(Error::ExportTimeout { deadline_secs: 1 }.exit_code(), 6);
        assert_eq!(Error::Data(String::new()).exit_code(), 4);
    }
}
