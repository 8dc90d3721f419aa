//! Application Settings Domain Model
//!
//! User-tunable configuration for the frontend core.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Number of history entries fetched per page.
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,

    /// Log level: error, warn, info, debug or trace.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether log output uses ANSI colors.
    #[serde(default = "default_ansi_logs")]
    pub ansi_logs: bool,
}

const fn default_history_page_size() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_ansi_logs() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            history_page_size: default_history_page_size(),
            log_level: default_log_level(),
            ansi_logs: default_ansi_logs(),
        }
    }
}

impl AppSettings {
    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPageSize` if the page size is zero.
    pub const fn validate(&self) -> DomainResult<()> {
        if self.history_page_size == 0 {
            return Err(DomainError::InvalidPageSize(0));
        }
        Ok(())
    }
}
