//! Service configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to the
//! defaults below. Example:
//!
//! ```json
//! {
//!   "api": { "base_url": "https://school.example.org/api", "max_retries": 2 },
//!   "server": { "bind": "0.0.0.0:8080", "default_school_id": "S1" },
//!   "timetable": {
//!     "days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
//!     "periods": [{ "startTime": "08:00", "endTime": "08:45" }]
//!   }
//! }
//! ```

use crate::timetable::TimetableLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub timetable: TimetableLayout,
}

/// Remote REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub user_agent: String,
    pub directory_cache_ttl_secs: u64,
    /// Consecutive failures before the breaker opens; 0 disables it
    pub breaker_threshold: u32,
    pub breaker_recovery_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_retries: 2,
            retry_base_ms: 200,
            user_agent: concat!("schooladmin/", env!("CARGO_PKG_VERSION")).to_string(),
            directory_cache_ttl_secs: 5 * 60,
            breaker_threshold: 5,
            breaker_recovery_secs: 30,
        }
    }
}

/// Local HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// School used when a request does not name one
    pub default_school_id: Option<String>,
    /// Editing sessions unused for this long are discarded
    pub session_idle_secs: u64,
    /// How often idle sessions and expired cache entries are swept
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            default_school_id: None,
            session_idle_secs: 30 * 60,
            sweep_interval_secs: 60,
        }
    }
}

impl DashboardConfig {
    /// Loads and validates a JSON config file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            days = config.timetable.days.len(),
            periods = config.timetable.period_count(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the timetable layout the grid engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.timetable;

        if layout.days.is_empty() {
            return Err(invalid("timetable.days must not be empty"));
        }
        for (i, day) in layout.days.iter().enumerate() {
            if layout.days[..i].contains(day) {
                return Err(invalid(format!("timetable.days lists {day} twice")));
            }
        }

        if layout.periods.is_empty() {
            return Err(invalid("timetable.periods must not be empty"));
        }
        for (i, period) in layout.periods.iter().enumerate() {
            if period.start_time >= period.end_time {
                return Err(invalid(format!(
                    "period {} ends at {} before it starts at {}",
                    i + 1,
                    period.end_label(),
                    period.start_label()
                )));
            }
        }

        if self.api.base_url.trim().is_empty() {
            return Err(invalid("api.base_url must not be empty"));
        }

        if self.server.session_idle_secs == 0 || self.server.sweep_interval_secs == 0 {
            return Err(invalid(
                "server.session_idle_secs and server.sweep_interval_secs must be positive",
            ));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
