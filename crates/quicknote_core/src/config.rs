//! Client configuration.
//!
//! # Responsibility
//! - Hold the explicit settings the front end hands to core.
//! - Normalize the API base URL into local-only or remote mode.
//!
//! # Invariants
//! - `api_base` never ends with `/` and is never empty.
//! - A missing `api_base` means local fallback mode.

use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = ".quicknote";
const FALLBACK_DB_FILE_NAME: &str = "quicknote_fallback.sqlite3";
const LOG_DIR_NAME: &str = "logs";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Normalized remote API base; `None` runs fully local.
    pub api_base: Option<String>,
    /// Directory for the fallback database and default log location.
    pub data_dir: PathBuf,
    /// Upper bound for one remote request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Builds a config with a raw base URL, normalizing it.
    pub fn new(api_base: Option<&str>, data_dir: impl AsRef<Path>) -> Self {
        Self {
            api_base: api_base.and_then(normalize_api_base),
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Path of the SQLite file backing the fallback slot.
    pub fn fallback_db_path(&self) -> PathBuf {
        self.data_dir.join(FALLBACK_DB_FILE_NAME)
    }

    /// Default rolling-log directory.
    pub fn default_log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

/// Trims whitespace and trailing slashes; blank input means "no remote".
pub fn normalize_api_base(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
