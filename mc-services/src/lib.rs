//! MiniChat Services - the application root and the services it mounts.
//!
//! This crate provides:
//! - `AppRoot`: composes the host bridge, sync context and services, and runs
//!   the startup and shutdown sequences
//! - `SyncContext`: explicitly owned handle to the sync provider
//! - `DemoAuth`: username-only sign-up/log-in and the auth overlay rule
//! - `ChatService`: create, open, send and read chats
//! - `EventBus`: typed application events over a broadcast channel
//! - `ErrorHandler`: process-level error reporting
//! - `Service` / `ServiceRegistry`: ordered service lifecycle

pub mod app;
pub mod auth;
pub mod chat;
pub mod context;
pub mod error_handler;
pub mod event_bus;
pub mod registry;
pub mod service;

// Re-export key types
pub use app::{AppPhase, AppRoot};
pub use auth::{should_show_auth_overlay, AuthState, AuthStateKind, DemoAuth};
pub use chat::ChatService;
pub use context::SyncContext;
pub use error_handler::{ErrorHandler, ReportedError};
pub use event_bus::{AppEvent, EventBus};
pub use registry::{ServiceHandle, ServiceRegistry};
pub use service::{Service, ServiceState};
