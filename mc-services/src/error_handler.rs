//! Process-level error handler.
//!
//! Errors that escape every other handler end up here. They are logged,
//! counted and published as [`AppEvent::ProcessError`]. Nothing is retried.
//!
//! One panic hook is installed per process. It reports to whichever handler
//! was registered last, so a process hosting one application routes every
//! uncaught panic to that application's handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};

use chrono::{DateTime, Utc};
use tracing::error;

use crate::event_bus::{AppEvent, EventBus};

static PANIC_HOOK: Once = Once::new();
static PROCESS_HANDLER: Mutex<Option<ErrorHandler>> = Mutex::new(None);

fn process_handler() -> std::sync::MutexGuard<'static, Option<ErrorHandler>> {
    PROCESS_HANDLER.lock().unwrap_or_else(|p| p.into_inner())
}

/// The last error the handler saw.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedError {
    pub source: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Shared process-level error handler.
#[derive(Clone)]
pub struct ErrorHandler {
    event_bus: EventBus,
    count: Arc<AtomicU64>,
    last: Arc<Mutex<Option<ReportedError>>>,
}

impl ErrorHandler {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            event_bus,
            count: Arc::new(AtomicU64::new(0)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Report an error raised by `source`.
    pub fn report(&self, source: &str, err: impl std::fmt::Display) {
        let message = err.to_string();
        error!("unhandled error in {source}: {message}");
        self.count.fetch_add(1, Ordering::Relaxed);
        *self.last.lock().unwrap_or_else(|p| p.into_inner()) = Some(ReportedError {
            source: source.to_string(),
            message: message.clone(),
            at: Utc::now(),
        });
        self.event_bus.emit(AppEvent::ProcessError {
            source: source.to_string(),
            message,
        });
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<ReportedError> {
        self.last.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Make this the process-wide handler for uncaught panics.
    ///
    /// The hook itself is installed once; later calls only switch which
    /// handler it reports to. The previous hook still runs afterwards.
    pub fn register_process_handler(&self) {
        *process_handler() = Some(self.clone());
        PANIC_HOOK.call_once(|| {
            let previous = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let handler = process_handler().clone();
                if let Some(handler) = handler {
                    handler.report("panic", info);
                }
                previous(info);
            }));
        });
    }

    /// Stop receiving panics, if this handler is the registered one.
    pub fn unregister_process_handler(&self) {
        let mut current = process_handler();
        if current.as_ref().is_some_and(|h| self.same_as(h)) {
            *current = None;
        }
    }

    /// Whether this handler is the process-wide one.
    pub fn is_process_handler(&self) -> bool {
        process_handler().as_ref().is_some_and(|h| self.same_as(h))
    }

    fn same_as(&self, other: &ErrorHandler) -> bool {
        Arc::ptr_eq(&self.count, &other.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_core::error::McError;

    #[tokio::test]
    async fn test_report_counts_and_emits() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let handler = ErrorHandler::new(bus);

        handler.report("startup", McError::HostInitFailure("no host".into()));

        assert_eq!(handler.error_count(), 1);
        let last = handler.last_error().unwrap();
        assert_eq!(last.source, "startup");
        assert!(last.message.contains("no host"));

        match rx.recv().await.unwrap() {
            AppEvent::ProcessError { source, message } => {
                assert_eq!(source, "startup");
                assert!(message.starts_with("host init failed"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_clones_share_count() {
        let handler = ErrorHandler::new(EventBus::new(8));
        let clone = handler.clone();
        clone.report("a", "first");
        handler.report("b", "second");
        assert_eq!(handler.error_count(), 2);
        assert_eq!(clone.last_error().unwrap().source, "b");
    }
}
