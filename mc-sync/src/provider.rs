//! The sync provider capability set.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};

use mc_core::error::McResult;
use mc_models::{Account, Chat, CoId, CoRef, Message};

use crate::endpoint::PeerEndpoint;
use crate::events::{ConnectionState, SyncEvent};

/// Replicated storage for the chat schema.
///
/// Persistence, replication and conflict resolution live behind this
/// trait; the application only creates values, appends references and
/// reads them back.
#[async_trait]
pub trait SyncProvider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Open the connection to `endpoint`.
    async fn connect(&self, endpoint: &PeerEndpoint) -> McResult<()>;

    /// Close the connection. Idempotent.
    async fn disconnect(&self);

    fn connection_state(&self) -> ConnectionState;

    /// Watch connection state transitions.
    fn state_receiver(&self) -> watch::Receiver<ConnectionState>;

    /// Subscribe to replicated state changes.
    fn subscribe(&self) -> broadcast::Receiver<SyncEvent>;

    /// Register an account (used by demo auth).
    async fn create_account(&self, username: &str) -> McResult<Account>;

    async fn find_account(&self, username: &str) -> McResult<Option<Account>>;

    async fn list_accounts(&self) -> McResult<Vec<Account>>;

    async fn create_chat(&self) -> McResult<Chat>;

    /// Store a new message value. It belongs to no chat until appended.
    async fn create_message(&self, message: Message) -> McResult<CoRef<Message>>;

    /// Append a message reference to the end of a chat. Returns its index.
    async fn append(&self, chat_id: &CoId, message: CoRef<Message>) -> McResult<usize>;

    /// Replace a message's text.
    async fn update_message_text(&self, message_id: &CoId, text: &str) -> McResult<()>;

    async fn load_chat(&self, chat_id: &CoId) -> McResult<Option<Chat>>;

    /// Load one message; `None` when it is not available locally.
    async fn load_message(&self, message_id: &CoId) -> McResult<Option<Message>>;

    /// Load every message referenced by `chat` that is available.
    async fn load_messages(&self, chat: &Chat) -> McResult<HashMap<CoId, Message>> {
        let mut loaded = HashMap::with_capacity(chat.len());
        for r in chat.refs() {
            if loaded.contains_key(r.id()) {
                continue;
            }
            if let Some(message) = self.load_message(r.id()).await? {
                loaded.insert(r.id().clone(), message);
            }
        }
        Ok(loaded)
    }
}
