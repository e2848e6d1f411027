//! Arena configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Limits and timings of the round registry.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Maximum number of live rounds.
    #[serde(default = "default_admission_cap")]
    admission_cap: usize,

    /// Delay between two looks at a mailbox wait flag, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,

    /// Period of the housekeeping sweep, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    sweep_interval_secs: u64,

    /// Inactivity after which a waiting round is forced to end, in seconds.
    #[serde(default = "default_idle_timeout_secs")]
    idle_timeout_secs: u64,

    /// Inactivity after which a finished round is deleted, in seconds.
    #[serde(default = "default_dead_round_secs")]
    dead_round_secs: u64,

    /// How recently an invitation must have been visited to be listed, in seconds.
    #[serde(default = "default_invitation_window_secs")]
    invitation_window_secs: u64,
}

fn default_admission_cap() -> usize {
    500
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_sweep_interval_secs() -> u64 {
    10
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_dead_round_secs() -> u64 {
    30
}

fn default_invitation_window_secs() -> u64 {
    2
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            admission_cap: default_admission_cap(),
            poll_interval_ms: default_poll_interval_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            dead_round_secs: default_dead_round_secs(),
            invitation_window_secs: default_invitation_window_secs(),
        }
    }
}

impl ArenaConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        config.check()?;
        info!(admission_cap = config.admission_cap, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Overrides the admission cap.
    pub fn with_admission_cap(mut self, cap: usize) -> Self {
        self.admission_cap = cap;
        self
    }

    /// Overrides the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::new("poll_interval_ms must be positive".to_string()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::new("sweep_interval_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Mailbox poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Sweep period.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Long inactivity window for waiting rounds.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Inactivity window for finished rounds.
    pub fn dead_round_window(&self) -> Duration {
        Duration::from_secs(self.dead_round_secs)
    }

    /// Recency window for listing invitations.
    pub fn invitation_window(&self) -> Duration {
        Duration::from_secs(self.invitation_window_secs)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
