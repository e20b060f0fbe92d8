//! Service registry: ordered init and shutdown of the application's services.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use mc_core::config::ConfigHandle;
use mc_core::error::{McError, McResult};

use crate::event_bus::EventBus;
use crate::service::{Service, ServiceState};

/// Shared, lockable handle to a registered service.
pub type ServiceHandle<S> = Arc<RwLock<S>>;

/// Holds the services of the mounted application tree.
///
/// Services are initialized in registration order and shut down in
/// reverse order. `register` returns a typed handle so the owner can keep
/// calling the concrete service after handing it to the registry.
pub struct ServiceRegistry {
    pub config: ConfigHandle,
    pub event_bus: EventBus,
    services: Vec<(String, Arc<RwLock<dyn Service>>)>,
}

impl ServiceRegistry {
    pub fn new(config: ConfigHandle, event_bus: EventBus) -> Self {
        Self {
            config,
            event_bus,
            services: Vec::new(),
        }
    }

    /// Register a service. Services are initialized in registration order.
    pub fn register<S: Service + 'static>(&mut self, service: S) -> ServiceHandle<S> {
        let name = service.name().to_string();
        let handle = Arc::new(RwLock::new(service));
        let erased: Arc<RwLock<dyn Service>> = handle.clone();
        info!("registered service: {name}");
        self.services.push((name, erased));
        handle
    }

    /// Initialize all registered services in order.
    pub async fn init_all(&self) -> McResult<()> {
        info!("initializing {} services", self.services.len());

        for (name, service) in &self.services {
            let mut svc = service.write().await;
            if let Err(e) = svc.init() {
                error!("failed to initialize service {name}: {e}");
                return Err(McError::ServiceInit(format!("{name}: {e}")));
            }
        }

        info!("all services initialized");
        Ok(())
    }

    /// Shut down all services in reverse order.
    ///
    /// A service that fails to stop is logged and the rest still stop.
    pub async fn shutdown_all(&self) -> McResult<()> {
        info!("shutting down services");

        for (name, service) in self.services.iter().rev() {
            let mut svc = service.write().await;
            if svc.state() != ServiceState::Running {
                continue;
            }
            if let Err(e) = svc.shutdown() {
                error!("error shutting down service {name}: {e}");
            }
        }

        info!("all services shut down");
        Ok(())
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Name, state and health of every service.
    pub async fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        let mut results = Vec::with_capacity(self.services.len());
        for (name, service) in &self.services {
            let svc = service.read().await;
            results.push((name.clone(), svc.state(), svc.is_healthy()));
        }
        results
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
