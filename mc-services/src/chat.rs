//! Chat service: the primary view's operations on a chat log.

use tokio::sync::watch;
use tracing::{debug, info};

use mc_core::error::{McError, McResult};
use mc_models::{Account, Chat, CoId, Message, Resolved};

use crate::auth::AuthState;
use crate::context::SyncContext;
use crate::service::{Service, ServiceState};

/// Opens, reads and writes chats through the sync context.
///
/// Sending requires a signed-in account, taken from the auth watch channel.
pub struct ChatService {
    state: ServiceState,
    context: SyncContext,
    auth: watch::Receiver<AuthState>,
}

impl ChatService {
    pub fn new(context: SyncContext, auth: watch::Receiver<AuthState>) -> Self {
        Self {
            state: ServiceState::Created,
            context,
            auth,
        }
    }

    /// Create an empty chat.
    pub async fn create_chat(&self) -> McResult<Chat> {
        let chat = self.context.provider()?.create_chat().await?;
        info!("created chat {}", chat.id);
        Ok(chat)
    }

    /// Load an existing chat.
    pub async fn open(&self, chat_id: &CoId) -> McResult<Chat> {
        self.context
            .provider()?
            .load_chat(chat_id)
            .await?
            .ok_or_else(|| McError::ChatNotFound(chat_id.to_string()))
    }

    /// Open `chat_id` when given, otherwise create a new chat.
    pub async fn open_or_create(&self, chat_id: Option<&CoId>) -> McResult<Chat> {
        match chat_id {
            Some(id) => self.open(id).await,
            None => self.create_chat().await,
        }
    }

    /// Send `text` to a chat as the signed-in account.
    ///
    /// The chat must exist before anything is written, so a failed send
    /// leaves no message behind. The message is created first and then its
    /// reference appended, so a reader never sees a reference to a message
    /// that does not exist.
    pub async fn send(&self, chat_id: &CoId, text: &str) -> McResult<Message> {
        let account = self.signed_in()?;
        self.open(chat_id).await?;
        let provider = self.context.provider()?;

        let message = Message::new(text).with_author(account.id.to_string());
        let reference = provider.create_message(message.clone()).await?;
        let index = provider.append(chat_id, reference).await?;
        debug!("appended message {} to chat {chat_id} at {index}", message.id);
        Ok(message)
    }

    /// Every entry of a chat, in insertion order.
    pub async fn history(&self, chat_id: &CoId) -> McResult<Vec<Resolved>> {
        let chat = self.open(chat_id).await?;
        let loaded = self.context.provider()?.load_messages(&chat).await?;
        Ok(chat.messages(&loaded).collect())
    }

    /// The last `limit` entries of a chat, in insertion order.
    pub async fn recent(&self, chat_id: &CoId, limit: usize) -> McResult<Vec<Resolved>> {
        let mut entries = self.history(chat_id).await?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }

    fn signed_in(&self) -> McResult<Account> {
        self.auth.borrow().account.clone().ok_or(McError::NotSignedIn)
    }
}

impl Service for ChatService {
    fn name(&self) -> &str {
        "chat"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> McResult<()> {
        self.state = ServiceState::Running;
        info!("chat service initialized");
        Ok(())
    }

    fn shutdown(&mut self) -> McResult<()> {
        self.state = ServiceState::Stopped;
        info!("chat service stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mc_core::constants::DEFAULT_SYNC_PEER;
    use mc_sync::{MemoryProvider, PeerEndpoint};

    use crate::auth::DemoAuth;
    use crate::event_bus::EventBus;

    async fn setup() -> (DemoAuth, ChatService) {
        let endpoint = PeerEndpoint::parse(DEFAULT_SYNC_PEER).unwrap();
        let ctx = SyncContext::new(Arc::new(MemoryProvider::new()), endpoint);
        let bus = EventBus::new(64);
        ctx.connect(&bus).await.unwrap();
        let auth = DemoAuth::new(ctx.clone(), bus);
        let chats = ChatService::new(ctx, auth.watch());
        (auth, chats)
    }

    #[tokio::test]
    async fn test_send_requires_sign_in() {
        let (_auth, chats) = setup().await;
        let chat = chats.create_chat().await.unwrap();
        let err = chats.send(&chat.id, "hi").await.unwrap_err();
        assert!(matches!(err, McError::NotSignedIn));
        assert!(chats.history(&chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_then_read_first_entry() {
        let (mut auth, chats) = setup().await;
        let account = auth.sign_up("alice").await.unwrap();
        let chat = chats.create_chat().await.unwrap();

        chats.send(&chat.id, "hello").await.unwrap();

        let history = chats.history(&chat.id).await.unwrap();
        let first = history[0].as_loaded().unwrap();
        assert_eq!(first.text, "hello");
        assert_eq!(first.author.as_deref(), Some(account.id.as_str()));
    }

    #[tokio::test]
    async fn test_recent_keeps_order() {
        let (mut auth, chats) = setup().await;
        auth.sign_up("alice").await.unwrap();
        let chat = chats.create_chat().await.unwrap();
        for i in 0..5 {
            chats.send(&chat.id, &format!("m{i}")).await.unwrap();
        }

        let texts: Vec<_> = chats
            .recent(&chat.id, 2)
            .await
            .unwrap()
            .into_iter()
            .filter_map(Resolved::into_loaded)
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["m3", "m4"]);
    }

    #[tokio::test]
    async fn test_send_to_unknown_chat_writes_nothing() {
        let endpoint = PeerEndpoint::parse(DEFAULT_SYNC_PEER).unwrap();
        let ctx = SyncContext::new(Arc::new(MemoryProvider::new()), endpoint);
        let bus = EventBus::new(64);
        ctx.connect(&bus).await.unwrap();
        let mut auth = DemoAuth::new(ctx.clone(), bus);
        auth.sign_up("alice").await.unwrap();
        let chats = ChatService::new(ctx.clone(), auth.watch());

        let mut events = ctx.provider().unwrap().subscribe();
        let err = chats.send(&CoId::new(), "lost").await.unwrap_err();
        assert!(matches!(err, McError::ChatNotFound(_)));
        assert!(matches!(
            events.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_open_unknown_chat() {
        let (_auth, chats) = setup().await;
        let err = chats.open(&CoId::new()).await.unwrap_err();
        assert!(matches!(err, McError::ChatNotFound(_)));
    }
}
