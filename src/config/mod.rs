//! Configuration management.
//!
//! Credentials for the Qualtrics API come from the environment (optionally
//! via a `.env` file loaded at startup); the database lives at a global
//! location under the user's home directory unless overridden.
//!
//! Missing credentials are a startup failure: the poll loop never starts
//! with a partial configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default per-request timeout for starting an export.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(30);
/// Default per-request timeout for a status check.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(30);
/// Default per-request timeout for the archive download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the Qualtrics survey export API.
#[derive(Debug, Clone)]
pub struct QualtricsConfig {
    /// API token sent in the `X-API-TOKEN` header.
    pub api_token: String,
    /// Base URL for the survey's API surface, normally derived as
    /// `https://{datacenter}.qualtrics.com/API/v3/surveys/{survey_id}`.
    pub base_url: String,
    pub start_timeout: Duration,
    pub status_timeout: Duration,
    pub download_timeout: Duration,
}

impl QualtricsConfig {
    /// Load configuration from the environment.
    ///
    /// Required: `QUALTRICS_API_TOKEN`, `QUALTRICS_DATA_CENTER`,
    /// `QUALTRICS_SURVEY_ID`. `QUALTRICS_BASE_URL` overrides the derived
    /// base URL (used by tests and proxies).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming every missing variable.
    pub fn from_env() -> Result<Self> {
        Self::from_parts(
            non_empty_env("QUALTRICS_API_TOKEN"),
            non_empty_env("QUALTRICS_DATA_CENTER"),
            non_empty_env("QUALTRICS_SURVEY_ID"),
            non_empty_env("QUALTRICS_BASE_URL"),
        )
    }

    /// Build a configuration from already-resolved values.
    ///
    /// Split out of [`from_env`](Self::from_env) so the validation rules
    /// are testable without touching process environment.
    pub fn from_parts(
        api_token: Option<String>,
        datacenter: Option<String>,
        survey_id: Option<String>,
        base_url_override: Option<String>,
    ) -> Result<Self> {
        let mut missing = Vec::new();
        if api_token.is_none() {
            missing.push("QUALTRICS_API_TOKEN");
        }
        // An explicit base URL stands in for datacenter + survey id.
        if base_url_override.is_none() {
            if datacenter.is_none() {
                missing.push("QUALTRICS_DATA_CENTER");
            }
            if survey_id.is_none() {
                missing.push("QUALTRICS_SURVEY_ID");
            }
        }
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing environment variables: {}",
                missing.join(", ")
            )));
        }

        let base_url = base_url_override.unwrap_or_else(|| {
            format!(
                "https://{}.qualtrics.com/API/v3/surveys/{}",
                datacenter.unwrap_or_default(),
                survey_id.unwrap_or_default()
            )
        });

        Ok(Self {
            api_token: api_token.unwrap_or_default(),
            base_url,
            start_timeout: DEFAULT_START_TIMEOUT,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get the global qualtrics-sync directory location (`~/.qualtrics-sync`).
#[must_use]
pub fn global_data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".qualtrics-sync"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. Explicit `--db` flag
/// 2. `QSYNC_DB` environment variable
/// 3. Global location: `~/.qualtrics-sync/data/responses.db`
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var("QSYNC_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    global_data_dir().map(|dir| dir.join("data").join("responses.db"))
}
