//! Typed event bus for application-level events.
//!
//! Uses a tokio broadcast channel so the view, the CLI and tests can follow
//! startup and chat activity without holding references to the services
//! that produce it.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use mc_host::WidgetKind;
use mc_models::CoId;
use mc_sync::ConnectionState;

use crate::auth::AuthStateKind;

/// Application-level state changes.
///
/// Provider-level [`mc_sync::SyncEvent`]s are translated into these by the
/// sync context; the remaining variants come from startup and auth.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The host bridge finished initializing.
    HostInitialized { debug: bool, host_ready: bool },
    /// A host widget mount completed. `error` is set when it failed.
    WidgetMounted {
        widget: WidgetKind,
        error: Option<String>,
    },
    /// Launch session data was restored after mounting.
    SessionRestored { user_id: Option<i64> },
    /// A chat was created.
    ChatCreated { chat_id: CoId },
    /// A message was appended to a chat at `index`.
    MessageAppended {
        chat_id: CoId,
        message_id: CoId,
        index: usize,
    },
    /// A message's text changed.
    MessageUpdated { message_id: CoId },
    /// The sync connection changed state.
    ConnectionStateChanged { state: ConnectionState },
    /// Demo auth moved to a new state.
    AuthStateChanged {
        state: AuthStateKind,
        username: Option<String>,
    },
    /// An error reached the process-level handler.
    ProcessError { source: String, message: String },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Subscribers that fall behind receive
/// `Lagged` and miss events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Human-readable label for an event (for logging).
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::HostInitialized { .. } => "HostInitialized",
        AppEvent::WidgetMounted { .. } => "WidgetMounted",
        AppEvent::SessionRestored { .. } => "SessionRestored",
        AppEvent::ChatCreated { .. } => "ChatCreated",
        AppEvent::MessageAppended { .. } => "MessageAppended",
        AppEvent::MessageUpdated { .. } => "MessageUpdated",
        AppEvent::ConnectionStateChanged { .. } => "ConnectionStateChanged",
        AppEvent::AuthStateChanged { .. } => "AuthStateChanged",
        AppEvent::ProcessError { .. } => "ProcessError",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_emit_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let chat_id = CoId::new();

        bus.emit(AppEvent::ChatCreated { chat_id: chat_id.clone() });

        match rx.recv().await.unwrap() {
            AppEvent::ChatCreated { chat_id: got } => assert_eq!(got, chat_id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(AppEvent::SessionRestored { user_id: Some(7) });

        assert_eq!(rx1.recv().await.unwrap(), AppEvent::SessionRestored { user_id: Some(7) });
        assert_eq!(rx2.recv().await.unwrap(), AppEvent::SessionRestored { user_id: Some(7) });
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(16);
        bus.emit(AppEvent::ConnectionStateChanged {
            state: ConnectionState::Connected,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_labels() {
        let event = AppEvent::WidgetMounted {
            widget: WidgetKind::Viewport,
            error: None,
        };
        assert_eq!(event_label(&event), "WidgetMounted");
        let event = AppEvent::ProcessError {
            source: "test".into(),
            message: "boom".into(),
        };
        assert_eq!(event_label(&event), "ProcessError");
    }
}
