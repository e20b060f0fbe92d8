//! Sync events and connection state.

use serde::Serialize;

use mc_models::CoId;

/// Connection state of a sync provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// A change to replicated state, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A new chat value exists.
    ChatCreated { chat_id: CoId },
    /// A new message value exists (not yet in any chat).
    MessageCreated { message_id: CoId },
    /// A message reference was appended to a chat at `index`.
    MessageAppended {
        chat_id: CoId,
        message_id: CoId,
        index: usize,
    },
    /// A message's text was replaced.
    MessageUpdated { message_id: CoId },
    /// Connection state changed.
    ConnectionChanged { state: ConnectionState },
}

impl SyncEvent {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ChatCreated { .. } => "chat_created",
            Self::MessageCreated { .. } => "message_created",
            Self::MessageAppended { .. } => "message_appended",
            Self::MessageUpdated { .. } => "message_updated",
            Self::ConnectionChanged { .. } => "connection_changed",
        }
    }

    /// Whether the event concerns `chat_id`.
    pub fn touches_chat(&self, chat_id: &CoId) -> bool {
        match self {
            Self::ChatCreated { chat_id: id } | Self::MessageAppended { chat_id: id, .. } => {
                id == chat_id
            }
            _ => false,
        }
    }
}
