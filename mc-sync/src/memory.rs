//! In-process sync provider.
//!
//! Keeps every value in memory and fans out [`SyncEvent`]s to subscribers.
//! Writes require a connected provider, matching a remote peer that only
//! accepts transactions over an open session.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{debug, info};

use mc_core::constants::SYNC_EVENT_CAPACITY;
use mc_core::error::{McError, McResult};
use mc_models::{Account, Chat, CoId, CoRef, Message};

use crate::endpoint::PeerEndpoint;
use crate::events::{ConnectionState, SyncEvent};
use crate::provider::SyncProvider;

#[derive(Default)]
struct Store {
    chats: HashMap<CoId, Chat>,
    messages: HashMap<CoId, Message>,
    accounts: Vec<Account>,
}

/// A [`SyncProvider`] backed by in-memory maps.
pub struct MemoryProvider {
    store: RwLock<Store>,
    endpoint: RwLock<Option<PeerEndpoint>>,
    state_tx: watch::Sender<ConnectionState>,
    events: broadcast::Sender<SyncEvent>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::with_capacity(SYNC_EVENT_CAPACITY)
    }

    /// Create a provider whose event channel buffers `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            store: RwLock::new(Store::default()),
            endpoint: RwLock::new(None),
            state_tx,
            events,
        }
    }

    /// The endpoint of the current session, if connected.
    pub async fn endpoint(&self) -> Option<PeerEndpoint> {
        self.endpoint.read().await.clone()
    }

    fn set_state(&self, state: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            self.emit(SyncEvent::ConnectionChanged { state });
        }
    }

    fn emit(&self, event: SyncEvent) {
        debug!("sync event: {}", event.label());
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn ensure_connected(&self) -> McResult<()> {
        match *self.state_tx.borrow() {
            ConnectionState::Connected => Ok(()),
            _ => Err(McError::Disconnected),
        }
    }
}

#[async_trait]
impl SyncProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn connect(&self, endpoint: &PeerEndpoint) -> McResult<()> {
        if self.connection_state() == ConnectionState::Connected {
            debug!("already connected");
            return Ok(());
        }
        self.set_state(ConnectionState::Connecting);
        *self.endpoint.write().await = Some(endpoint.clone());
        self.set_state(ConnectionState::Connected);
        info!("sync provider connected to {endpoint}");
        Ok(())
    }

    async fn disconnect(&self) {
        if self.connection_state() == ConnectionState::Disconnected {
            return;
        }
        *self.endpoint.write().await = None;
        self.set_state(ConnectionState::Disconnected);
        info!("sync provider disconnected");
    }

    fn connection_state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    async fn create_account(&self, username: &str) -> McResult<Account> {
        self.ensure_connected()?;
        let username = username.trim();
        if username.is_empty() {
            return Err(McError::Auth("username is empty".into()));
        }

        let mut store = self.store.write().await;
        if store.accounts.iter().any(|a| a.username == username) {
            return Err(McError::Auth(format!("username {username} is taken")));
        }
        let account = Account::new(username);
        store.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account(&self, username: &str) -> McResult<Option<Account>> {
        let store = self.store.read().await;
        Ok(store
            .accounts
            .iter()
            .find(|a| a.username == username.trim())
            .cloned())
    }

    async fn list_accounts(&self) -> McResult<Vec<Account>> {
        Ok(self.store.read().await.accounts.clone())
    }

    async fn create_chat(&self) -> McResult<Chat> {
        self.ensure_connected()?;
        let chat = Chat::new();
        self.store
            .write()
            .await
            .chats
            .insert(chat.id.clone(), chat.clone());
        self.emit(SyncEvent::ChatCreated { chat_id: chat.id.clone() });
        Ok(chat)
    }

    async fn create_message(&self, message: Message) -> McResult<CoRef<Message>> {
        self.ensure_connected()?;
        let reference = message.co_ref();
        self.store
            .write()
            .await
            .messages
            .insert(message.id.clone(), message);
        self.emit(SyncEvent::MessageCreated {
            message_id: reference.id().clone(),
        });
        Ok(reference)
    }

    async fn append(&self, chat_id: &CoId, message: CoRef<Message>) -> McResult<usize> {
        self.ensure_connected()?;
        let index = {
            let mut store = self.store.write().await;
            if !store.messages.contains_key(message.id()) {
                return Err(McError::MessageNotFound(message.id().to_string()));
            }
            let chat = store
                .chats
                .get_mut(chat_id)
                .ok_or_else(|| McError::ChatNotFound(chat_id.to_string()))?;
            chat.append(message.clone());
            chat.len() - 1
        };
        self.emit(SyncEvent::MessageAppended {
            chat_id: chat_id.clone(),
            message_id: message.id().clone(),
            index,
        });
        Ok(index)
    }

    async fn update_message_text(&self, message_id: &CoId, text: &str) -> McResult<()> {
        self.ensure_connected()?;
        {
            let mut store = self.store.write().await;
            let message = store
                .messages
                .get_mut(message_id)
                .ok_or_else(|| McError::MessageNotFound(message_id.to_string()))?;
            message.text = text.to_string();
        }
        self.emit(SyncEvent::MessageUpdated {
            message_id: message_id.clone(),
        });
        Ok(())
    }

    async fn load_chat(&self, chat_id: &CoId) -> McResult<Option<Chat>> {
        Ok(self.store.read().await.chats.get(chat_id).cloned())
    }

    async fn load_message(&self, message_id: &CoId) -> McResult<Option<Message>> {
        Ok(self.store.read().await.messages.get(message_id).cloned())
    }
}
