//! MiniChat Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other MiniChat crates:
//! - Application configuration (sync peer, host launch data, logging)
//! - Global error types covering every startup and runtime failure
//! - Structured logging with tracing
//! - Build mode and platform directory detection
//! - Common constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{McError, McResult};
pub use logging::init_logging;
pub use platform::{BuildMode, Platform};
