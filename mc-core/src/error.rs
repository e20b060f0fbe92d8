//! Global error types for the MiniChat application.
//!
//! All error categories across the application are unified into a single
//! `McError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using McError.
pub type McResult<T> = Result<T, McError>;

/// Unified error type covering all error categories in MiniChat.
#[derive(Error, Debug)]
pub enum McError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Host platform errors --
    /// The host SDK bootstrap failed.
    #[error("host init failed: {0}")]
    HostInitFailure(String),

    /// A single host widget failed to mount.
    #[error("failed to mount {widget}: {reason}")]
    MountFailure {
        /// Widget that failed.
        widget: String,
        /// Failure reason reported by the host.
        reason: String,
    },

    /// The bridge was asked to mount a second time.
    #[error("host components already mounted")]
    AlreadyMounted,

    /// An operation was attempted in the wrong lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Launch parameters were missing or malformed.
    #[error("launch params error: {0}")]
    LaunchParams(String),

    // -- Sync errors --
    /// The sync peer endpoint could not be parsed.
    #[error("invalid sync endpoint: {0}")]
    InvalidEndpoint(String),

    /// The sync provider rejected or failed an operation.
    #[error("sync error: {0}")]
    Sync(String),

    /// The sync provider is not connected.
    #[error("sync provider disconnected")]
    Disconnected,

    /// Chat not found.
    #[error("chat not found: {0}")]
    ChatNotFound(String),

    /// Message not found.
    #[error("message not found: {0}")]
    MessageNotFound(String),

    // -- Auth errors --
    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// An operation needs a signed-in account.
    #[error("not signed in")]
    NotSignedIn,

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Service errors --
    /// A service failed to initialize.
    #[error("service init error: {0}")]
    ServiceInit(String),

    // -- Generic --
    /// An uncaught error reported to the process-wide handler.
    #[error("process error: {0}")]
    Process(String),

    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl McError {
    /// Build a mount failure for the named widget.
    pub fn mount(widget: impl Into<String>, reason: impl Into<String>) -> Self {
        McError::MountFailure {
            widget: widget.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for McError {
    fn from(e: serde_json::Error) -> Self {
        McError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for McError {
    fn from(e: toml::de::Error) -> Self {
        McError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mc_error_display() {
        let err = McError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_mount_failure_display() {
        let err = McError::mount("viewport", "host went away");
        assert_eq!(err.to_string(), "failed to mount viewport: host went away");
    }

    #[test]
    fn test_json_error_conversion() {
        let e: McError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(e, McError::Serialization(_)));
    }
}
