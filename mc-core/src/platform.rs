//! Build mode and OS-specific directories.

use std::path::PathBuf;
use crate::error::{McError, McResult};

/// Whether this binary was built for development or production.
///
/// Fixed at compile time by the `development` cargo feature so that
/// development-only code paths can be removed with `#[cfg]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    /// The mode this crate was compiled in.
    pub const fn current() -> Self {
        if cfg!(feature = "development") {
            BuildMode::Development
        } else {
            BuildMode::Production
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, BuildMode::Development)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// OS-specific application directories.
pub struct Platform;

impl Platform {
    /// Get the platform-specific application data directory.
    ///
    /// - Windows: `%APPDATA%/MiniChat`
    /// - macOS: `~/Library/Application Support/MiniChat`
    /// - Linux: `~/.local/share/MiniChat`
    pub fn data_dir() -> McResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| McError::Config("could not determine data directory".into()))?;
        Ok(base.join("MiniChat"))
    }

    /// Get the platform-specific configuration directory.
    pub fn config_dir() -> McResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| McError::Config("could not determine config directory".into()))?;
        Ok(base.join("MiniChat"))
    }
}
