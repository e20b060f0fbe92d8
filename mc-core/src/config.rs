//! Application configuration management.
//!
//! Handles loading, saving, and accessing application configuration: the
//! sync peer the chat replicates through, how launch data reaches the host
//! bridge, logging, and display preferences. Configuration is persisted as
//! TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{McError, McResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sync provider settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Host platform settings.
    #[serde(default)]
    pub host: HostConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Chat display settings.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Sync provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Peer connection string, `wss://<host>/?key=<app-key>`.
    #[serde(default = "default_peer")]
    pub peer: String,

    /// Capacity of the provider's update channel.
    #[serde(default = "default_sync_capacity")]
    pub event_capacity: usize,
}

/// When the development mock replaces the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockProbe {
    /// Leave the environment alone if real launch data is already present.
    #[default]
    DetectAndSkip,
    /// Always install the synthetic launch data.
    Always,
}

/// Host platform configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Raw launch parameters as handed over by the host (query-string form).
    /// Empty means the process is not hosted.
    #[serde(default)]
    pub launch_params: String,

    /// Probe policy for the development mock environment.
    #[serde(default)]
    pub mock_probe: MockProbe,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// Chat display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Show message timestamps in the transcript.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Use 24-hour time format.
    #[serde(default)]
    pub use_24hr_format: bool,

    /// Number of messages replayed when a chat is opened.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

// Default value functions for serde

fn default_peer() -> String {
    constants::DEFAULT_SYNC_PEER.to_string()
}

fn default_sync_capacity() -> usize {
    constants::SYNC_EVENT_CAPACITY
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_limit() -> usize {
    50
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            peer: default_peer(),
            event_capacity: default_sync_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            use_24hr_format: false,
            history_limit: default_history_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> McResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> McResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> McResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| McError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> McResult<PathBuf> {
        let config_dir = Platform::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> McResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = Platform::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Whether launch data for a real host has been configured.
    pub fn has_launch_params(&self) -> bool {
        !self.host.launch_params.trim().is_empty()
    }

    /// Check that the values the startup sequence depends on are usable.
    pub fn validate(&self) -> McResult<()> {
        if self.sync.peer.trim().is_empty() {
            return Err(McError::MissingConfig("sync.peer".into()));
        }
        if self.sync.event_capacity == 0 {
            return Err(McError::Config("sync.event_capacity must be positive".into()));
        }
        Ok(())
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}
