//! MiniChat Models - the shared log schema and host launch records.
//!
//! This crate owns the shapes that cross subsystem boundaries: the
//! replicated `Message` and `Chat` values handed to the sync provider,
//! typed references between them, the demo `Account`, and the launch and
//! session data produced by the host platform.

pub mod ids;
pub mod models;
pub mod resolve;

// Re-export key types
pub use ids::{CoId, CoRef};
pub use models::account::Account;
pub use models::chat::{Chat, ChatMessages};
pub use models::launch::{HostUser, InitData, LaunchParams, ThemeParams};
pub use models::message::Message;
pub use resolve::{Resolved, Resolver};
