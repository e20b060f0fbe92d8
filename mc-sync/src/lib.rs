//! MiniChat Sync - the real-time sync provider seam.
//!
//! This crate provides:
//! - `PeerEndpoint`: the `wss://<host>/?key=<app-key>` connection string
//! - `SyncProvider`: the capability set the application consumes for
//!   replicated values (create, append, load, subscribe)
//! - `MemoryProvider`: an in-process provider keeping values in memory
//! - Sync events and connection state, fanned out over tokio channels

pub mod endpoint;
pub mod events;
pub mod memory;
pub mod provider;

// Re-export key types
pub use endpoint::PeerEndpoint;
pub use events::{ConnectionState, SyncEvent};
pub use memory::MemoryProvider;
pub use provider::SyncProvider;
