//! Sync context: the explicitly owned handle to the sync provider.
//!
//! Created once by the application root, handed to every service that
//! needs replicated state, and disposed at shutdown. While connected, a
//! forwarding task translates provider events onto the [`EventBus`]. On
//! dispose the task drains what the provider already published, so the
//! final disconnect still reaches the bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use mc_core::error::{McError, McResult};
use mc_sync::{ConnectionState, PeerEndpoint, SyncEvent, SyncProvider};

use crate::event_bus::{AppEvent, EventBus};

/// Shared handle to the sync provider and its session.
#[derive(Clone)]
pub struct SyncContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    provider: Arc<dyn SyncProvider>,
    endpoint: PeerEndpoint,
    forwarder: Mutex<Option<Forwarder>>,
    disposed: AtomicBool,
}

struct Forwarder {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl SyncContext {
    pub fn new(provider: Arc<dyn SyncProvider>, endpoint: PeerEndpoint) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                provider,
                endpoint,
                forwarder: Mutex::new(None),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn endpoint(&self) -> &PeerEndpoint {
        &self.inner.endpoint
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.provider.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// The provider, if the context has not been disposed.
    pub fn provider(&self) -> McResult<&Arc<dyn SyncProvider>> {
        if self.is_disposed() {
            return Err(McError::InvalidState("sync context has been disposed".into()));
        }
        Ok(&self.inner.provider)
    }

    /// Connect to the peer and start forwarding provider events to `bus`.
    pub async fn connect(&self, bus: &EventBus) -> McResult<()> {
        let provider = self.provider()?;
        // Subscribe first so the connection transitions are forwarded too.
        let events = provider.subscribe();
        {
            let mut forwarder = self.forwarder_slot();
            if forwarder.is_none() {
                let (stop, stopped) = oneshot::channel();
                let handle = tokio::spawn(forward_events(events, bus.clone(), stopped));
                *forwarder = Some(Forwarder { stop, handle });
            }
        }

        if let Err(e) = provider.connect(&self.inner.endpoint).await {
            self.stop_forwarding().await;
            return Err(e);
        }
        info!(
            "sync context connected via {} provider to {}",
            provider.name(),
            self.inner.endpoint
        );
        Ok(())
    }

    /// Disconnect and release the provider. Idempotent.
    pub async fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.provider.disconnect().await;
        self.stop_forwarding().await;
        info!("sync context disposed");
    }

    fn forwarder_slot(&self) -> std::sync::MutexGuard<'_, Option<Forwarder>> {
        self.inner
            .forwarder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stop the forwarder after it has drained the queued events.
    async fn stop_forwarding(&self) {
        let forwarder = self.forwarder_slot().take();
        if let Some(Forwarder { stop, handle }) = forwarder {
            // The task may already have exited on a closed stream.
            let _ = stop.send(());
            if let Err(e) = handle.await {
                warn!("sync event forwarder ended abnormally: {e}");
            }
        }
    }
}

async fn forward_events(
    mut events: broadcast::Receiver<SyncEvent>,
    bus: EventBus,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => forward(&bus, event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("sync event forwarder lagged, {skipped} event(s) dropped");
                }
                Err(RecvError::Closed) => {
                    debug!("sync event stream closed");
                    return;
                }
            },
            _ = &mut stop => break,
        }
    }

    loop {
        match events.try_recv() {
            Ok(event) => forward(&bus, event),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!("sync event forwarder lagged, {skipped} event(s) dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    debug!("sync event forwarder stopped");
}

fn forward(bus: &EventBus, event: SyncEvent) {
    if let Some(app_event) = translate(event) {
        bus.emit(app_event);
    }
}

fn translate(event: SyncEvent) -> Option<AppEvent> {
    match event {
        SyncEvent::ChatCreated { chat_id } => Some(AppEvent::ChatCreated { chat_id }),
        SyncEvent::MessageAppended {
            chat_id,
            message_id,
            index,
        } => Some(AppEvent::MessageAppended {
            chat_id,
            message_id,
            index,
        }),
        SyncEvent::MessageUpdated { message_id } => Some(AppEvent::MessageUpdated { message_id }),
        SyncEvent::ConnectionChanged { state } => Some(AppEvent::ConnectionStateChanged { state }),
        // Unattached messages are not visible to the view.
        SyncEvent::MessageCreated { .. } => None,
    }
}
