//! Application root: composes the host bridge, the sync context and the
//! services into one mounted application.
//!
//! Startup sequence:
//! 1. (development builds) install the mock host environment
//! 2. initialize the platform bridge
//! 3. connect the sync context to the configured peer
//! 4. mount the view tree: init services, load auth state
//! 5. mount the host widgets exactly once and log the launching user
//!
//! The root's [`ErrorHandler`] is registered as the process-wide panic
//! handler for as long as the application runs.

use std::sync::Arc;

use tracing::{error, info, warn};

use mc_core::config::{AppConfig, ConfigHandle};
use mc_core::constants::EVENT_BUS_CAPACITY;
use mc_core::error::{McError, McResult};
use mc_core::platform::BuildMode;
use mc_host::{
    aborted_viewport, BridgeState, HostEnvironment, HostSdk, MiniAppSdk, MountReport,
    PendingMount, PlatformBridge,
};
use mc_sync::{PeerEndpoint, SyncProvider};

use crate::auth::DemoAuth;
use crate::chat::ChatService;
use crate::context::SyncContext;
use crate::error_handler::ErrorHandler;
use crate::event_bus::{AppEvent, EventBus};
use crate::registry::{ServiceHandle, ServiceRegistry};

/// Application lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    NotStarted,
    Starting,
    Running,
    ShuttingDown,
    Stopped,
    /// Startup aborted.
    Failed,
}

impl std::fmt::Display for AppPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The composed application.
pub struct AppRoot {
    config: ConfigHandle,
    mode: BuildMode,
    phase: AppPhase,
    env: HostEnvironment,
    bridge: PlatformBridge,
    context: SyncContext,
    registry: ServiceRegistry,
    auth: ServiceHandle<DemoAuth>,
    chats: ServiceHandle<ChatService>,
    errors: ErrorHandler,
}

impl AppRoot {
    /// Compose the application against `env` with the stock host SDK.
    pub fn new(
        config: AppConfig,
        env: HostEnvironment,
        provider: Arc<dyn SyncProvider>,
    ) -> McResult<Self> {
        let sdk = Arc::new(MiniAppSdk::new(env.clone()));
        Self::with_sdk(config, env, sdk, provider)
    }

    /// Compose the application with a custom host SDK.
    pub fn with_sdk(
        config: AppConfig,
        env: HostEnvironment,
        sdk: Arc<dyn HostSdk>,
        provider: Arc<dyn SyncProvider>,
    ) -> McResult<Self> {
        config.validate()?;
        let endpoint = PeerEndpoint::parse(&config.sync.peer)?;

        let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
        let context = SyncContext::new(provider, endpoint);
        let mut registry = ServiceRegistry::new(ConfigHandle::new(config), event_bus.clone());

        let auth = DemoAuth::new(context.clone(), event_bus.clone());
        let auth_rx = auth.watch();
        let auth = registry.register(auth);
        let chats = registry.register(ChatService::new(context.clone(), auth_rx));

        Ok(Self {
            config: registry.config.clone(),
            mode: BuildMode::current(),
            phase: AppPhase::NotStarted,
            env,
            bridge: PlatformBridge::new(sdk),
            context,
            registry,
            auth,
            chats,
            errors: ErrorHandler::new(event_bus),
        })
    }

    /// Run the startup sequence and return the host mount report.
    ///
    /// Any failure is reported to the error handler and leaves the
    /// application in [`AppPhase::Failed`].
    pub async fn start(&mut self) -> McResult<MountReport> {
        if self.phase != AppPhase::NotStarted {
            return Err(McError::InvalidState(format!("start called while {}", self.phase)));
        }
        self.phase = AppPhase::Starting;
        self.errors.register_process_handler();
        info!("starting application (mode={})", self.mode);

        match self.run_startup().await {
            Ok(report) => {
                self.phase = AppPhase::Running;
                info!("startup complete");
                Ok(report)
            }
            Err(e) => {
                self.phase = AppPhase::Failed;
                self.errors.report("startup", &e);
                Err(e)
            }
        }
    }

    async fn run_startup(&mut self) -> McResult<MountReport> {
        #[cfg(feature = "development")]
        self.install_mock().await?;

        self.bridge.initialize(self.mode).await?;
        if let BridgeState::Initialized { debug, host_ready } = self.bridge.state() {
            self.event_bus().emit(AppEvent::HostInitialized { debug, host_ready });
        }

        self.context.connect(self.registry.event_bus()).await?;

        self.registry.init_all().await?;
        self.auth.write().await.refresh().await?;

        let MountReport {
            session,
            outcomes,
            viewport,
        } = self.bridge.mount()?;
        for outcome in &outcomes {
            self.event_bus().emit(AppEvent::WidgetMounted {
                widget: outcome.widget,
                error: outcome.failure(),
            });
        }
        let report = MountReport {
            session,
            outcomes,
            viewport: self.observe_viewport(viewport),
        };

        let user_id = report.user_id();
        match user_id {
            Some(id) => info!("launched by user {id}"),
            None => warn!("no user in restored session data"),
        }
        self.event_bus().emit(AppEvent::SessionRestored { user_id });
        Ok(report)
    }

    /// Publish the viewport outcome once its task completes. A task that
    /// died is reported to the error handler as well.
    fn observe_viewport(&self, viewport: PendingMount) -> PendingMount {
        let bus = self.event_bus().clone();
        let errors = self.errors.clone();
        PendingMount::from_task(tokio::spawn(async move {
            let outcome = match viewport.join().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    errors.report("viewport", &e);
                    aborted_viewport(&e)
                }
            };
            bus.emit(AppEvent::WidgetMounted {
                widget: outcome.widget,
                error: outcome.failure(),
            });
            outcome
        }))
    }

    #[cfg(feature = "development")]
    async fn install_mock(&self) -> McResult<()> {
        let probe = self.config.read().await.host.mock_probe;
        mc_host::mock::MockEnvironment::new().install(&self.env, probe)?;
        Ok(())
    }

    /// Shut services down in reverse order and dispose the sync context.
    pub async fn shutdown(&mut self) -> McResult<()> {
        if matches!(self.phase, AppPhase::Stopped | AppPhase::ShuttingDown) {
            return Ok(());
        }
        info!("starting shutdown sequence");
        self.phase = AppPhase::ShuttingDown;

        if let Err(e) = self.registry.shutdown_all().await {
            error!("error while stopping services: {e}");
        }
        self.context.dispose().await;
        self.errors.unregister_process_handler();

        self.phase = AppPhase::Stopped;
        info!("shutdown sequence complete");
        Ok(())
    }

    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.env
    }

    pub fn bridge_state(&self) -> BridgeState {
        self.bridge.state()
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub fn auth(&self) -> &ServiceHandle<DemoAuth> {
        &self.auth
    }

    pub fn chats(&self) -> &ServiceHandle<ChatService> {
        &self.chats
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn event_bus(&self) -> &EventBus {
        self.registry.event_bus()
    }

    pub fn error_handler(&self) -> &ErrorHandler {
        &self.errors
    }
}
