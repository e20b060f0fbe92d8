//! Service trait and lifecycle state.
//!
//! Services are registered with the `ServiceRegistry`, initialized in
//! registration order once the sync context is connected, and shut down in
//! reverse order.

use mc_core::error::McResult;

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Created but not initialized.
    Created,
    /// Running and ready.
    Running,
    /// Stopped after shutdown.
    Stopped,
    /// Initialization failed.
    Failed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A component of the mounted application tree.
pub trait Service: Send + Sync {
    /// Human-readable name of this service.
    fn name(&self) -> &str;

    fn state(&self) -> ServiceState;

    /// Called once while the application root mounts.
    fn init(&mut self) -> McResult<()>;

    /// Called once while the application root shuts down.
    fn shutdown(&mut self) -> McResult<()>;

    /// Returns true if the service is operational.
    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        state: ServiceState,
    }

    impl Service for Probe {
        fn name(&self) -> &str {
            "probe"
        }
        fn state(&self) -> ServiceState {
            self.state
        }
        fn init(&mut self) -> McResult<()> {
            self.state = ServiceState::Running;
            Ok(())
        }
        fn shutdown(&mut self) -> McResult<()> {
            self.state = ServiceState::Stopped;
            Ok(())
        }
    }

    #[test]
    fn test_service_lifecycle() {
        let mut svc = Probe { state: ServiceState::Created };
        assert!(!svc.is_healthy());
        svc.init().unwrap();
        assert!(svc.is_healthy());
        svc.shutdown().unwrap();
        assert!(!svc.is_healthy());
        assert_eq!(svc.state().to_string(), "stopped");
    }
}
