//! MiniChat Host - bridge to the platform that embeds the mini-app.
//!
//! This crate provides:
//! - `HostEnvironment`: the launch data, CSS variables and event channel the host exposes
//! - `HostSdk`: the capability set consumed from the host SDK, with `MiniAppSdk` as the
//!   implementation that runs against a `HostEnvironment`
//! - `PlatformBridge`: the initialize/mount state machine with per-widget outcomes
//! - `mock`: a synthetic host environment, compiled only for development builds

pub mod bridge;
pub mod environment;
pub mod sdk;
pub mod widget;

#[cfg(any(test, feature = "development"))]
pub mod mock;

// Re-export key types
pub use bridge::{aborted_viewport, BridgeState, MountReport, MountSummary, PendingMount, PlatformBridge};
pub use environment::{HostEnvironment, HostEvent, Viewport};
pub use sdk::{HostSdk, MiniAppSdk};
pub use widget::{WidgetKind, WidgetOutcome};

/// Whether the mock host environment was compiled into this build.
pub const fn mock_compiled() -> bool {
    cfg!(any(test, feature = "development"))
}
