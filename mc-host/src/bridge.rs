//! Platform bridge: initializes the host SDK and mounts its widgets.
//!
//! ```text
//! Uninitialized --initialize--> Initialized --mount--> Mounted
//!       \--initialize (production, host failure)--> Failed
//! ```
//!
//! `mount` is one-shot. Each widget mount is contained: a failure is logged
//! and recorded in the report, and the remaining widgets still mount. The
//! viewport completes on a spawned task, so `mount` returns the restored
//! session before the viewport has settled.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use mc_core::error::{McError, McResult};
use mc_core::platform::BuildMode;
use mc_models::InitData;

use crate::sdk::HostSdk;
use crate::widget::{WidgetKind, WidgetOutcome};

/// Lifecycle state of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Initialized {
        /// Whether host debug mode was switched on.
        debug: bool,
        /// Whether the host SDK bootstrap succeeded.
        host_ready: bool,
    },
    Mounted,
    Failed,
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized { host_ready: true, .. } => write!(f, "initialized"),
            Self::Initialized { host_ready: false, .. } => write!(f, "initialized (degraded)"),
            Self::Mounted => write!(f, "mounted"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The viewport mount, still running on its own task.
#[derive(Debug)]
pub struct PendingMount {
    inner: PendingInner,
}

#[derive(Debug)]
enum PendingInner {
    Running(JoinHandle<WidgetOutcome>),
    Done(WidgetOutcome),
}

impl PendingMount {
    /// Track a mount running on `handle`.
    pub fn from_task(handle: JoinHandle<WidgetOutcome>) -> Self {
        Self { inner: PendingInner::Running(handle) }
    }

    fn done(outcome: WidgetOutcome) -> Self {
        Self { inner: PendingInner::Done(outcome) }
    }

    /// Whether the mount has completed.
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            PendingInner::Running(handle) => handle.is_finished(),
            PendingInner::Done(_) => true,
        }
    }

    /// Wait for the mount task. A task that panicked or was cancelled is
    /// returned as the `JoinError`.
    pub async fn join(self) -> Result<WidgetOutcome, JoinError> {
        match self.inner {
            PendingInner::Done(outcome) => Ok(outcome),
            PendingInner::Running(handle) => handle.await,
        }
    }

    /// Wait for the mount to complete. A lost task counts as a failed mount.
    pub async fn wait(self) -> WidgetOutcome {
        match self.join().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("viewport mount task aborted: {e}");
                aborted_viewport(&e)
            }
        }
    }
}

/// The outcome recorded for a viewport task that never finished.
pub fn aborted_viewport(err: &JoinError) -> WidgetOutcome {
    let widget = WidgetKind::Viewport;
    WidgetOutcome::new(widget, Err(McError::mount(widget.name(), format!("task aborted: {err}"))))
}

/// What `mount` produced, available as soon as it returns.
#[derive(Debug)]
pub struct MountReport {
    /// Session data restored from the host, if any.
    pub session: Option<InitData>,
    /// Outcomes of the synchronously mounted widgets, in mount order.
    pub outcomes: Vec<WidgetOutcome>,
    /// The asynchronous viewport mount.
    pub viewport: PendingMount,
}

impl MountReport {
    pub fn user_id(&self) -> Option<i64> {
        self.session.as_ref().and_then(InitData::user_id)
    }

    /// Wait for the viewport and return every outcome in mount order.
    pub async fn settle(self) -> MountSummary {
        let mut outcomes = self.outcomes;
        outcomes.push(self.viewport.wait().await);
        outcomes.sort_by_key(|o| o.widget);
        MountSummary {
            session: self.session,
            outcomes,
        }
    }
}

/// All widget outcomes after the viewport settled.
pub struct MountSummary {
    pub session: Option<InitData>,
    pub outcomes: Vec<WidgetOutcome>,
}

impl MountSummary {
    pub fn all_mounted(&self) -> bool {
        self.outcomes.iter().all(WidgetOutcome::is_mounted)
    }

    pub fn failed(&self) -> Vec<WidgetKind> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_mounted())
            .map(|o| o.widget)
            .collect()
    }

    pub fn outcome(&self, widget: WidgetKind) -> Option<&WidgetOutcome> {
        self.outcomes.iter().find(|o| o.widget == widget)
    }
}

/// Sequences host SDK initialization and widget mounting.
pub struct PlatformBridge {
    sdk: Arc<dyn HostSdk>,
    state: BridgeState,
}

impl PlatformBridge {
    pub fn new(sdk: Arc<dyn HostSdk>) -> Self {
        Self {
            sdk,
            state: BridgeState::Uninitialized,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Bootstrap the host SDK.
    ///
    /// Debug mode is on when the host passed the `debug` start parameter or
    /// this is a development build. A host bootstrap failure is fatal in
    /// production; in development it is logged and the bridge continues in
    /// a degraded state.
    pub async fn initialize(&mut self, mode: BuildMode) -> McResult<()> {
        if self.state != BridgeState::Uninitialized {
            return Err(McError::InvalidState(format!(
                "initialize called while bridge is {}",
                self.state
            )));
        }

        let debug_on = mode.is_development()
            || self
                .sdk
                .launch_params()
                .map(|p| p.requests_debug())
                .unwrap_or(false);
        self.sdk.set_debug(debug_on);

        match self.sdk.init().await {
            Ok(()) => {
                info!("host bridge initialized (mode={mode}, debug={debug_on})");
                self.state = BridgeState::Initialized { debug: debug_on, host_ready: true };
                Ok(())
            }
            Err(e) if mode.is_development() => {
                warn!("host sdk init failed, continuing in development mode: {e}");
                self.state = BridgeState::Initialized { debug: debug_on, host_ready: false };
                Ok(())
            }
            Err(e) => {
                error!("host sdk init failed: {e}");
                self.state = BridgeState::Failed;
                Err(match e {
                    e @ McError::HostInitFailure(_) => e,
                    other => McError::HostInitFailure(other.to_string()),
                })
            }
        }
    }

    /// Mount every host widget and restore session data.
    ///
    /// Order: back button, theme params, viewport (spawned), mini-app chrome,
    /// then session restore. Must be called from within a tokio runtime for
    /// the viewport to mount.
    pub fn mount(&mut self) -> McResult<MountReport> {
        match self.state {
            BridgeState::Initialized { .. } => {}
            BridgeState::Mounted => return Err(McError::AlreadyMounted),
            other => {
                return Err(McError::InvalidState(format!("cannot mount while bridge is {other}")));
            }
        }

        let mut outcomes = Vec::with_capacity(3);
        outcomes.push(self.mount_sync(WidgetKind::BackButton));
        outcomes.push(self.mount_sync(WidgetKind::ThemeParams));
        let viewport = self.spawn_viewport();
        outcomes.push(self.mount_sync(WidgetKind::MiniApp));

        let session = match self.sdk.restore_init_data() {
            Ok(session) => session,
            Err(e) => {
                warn!("failed to restore session data: {e}");
                None
            }
        };

        self.state = BridgeState::Mounted;
        let mounted = outcomes.iter().filter(|o| o.is_mounted()).count();
        info!("host components mounted ({mounted}/{} synchronous widgets ok)", outcomes.len());

        Ok(MountReport {
            session,
            outcomes,
            viewport,
        })
    }

    fn mount_sync(&self, widget: WidgetKind) -> WidgetOutcome {
        let sdk = &self.sdk;
        let result = sdk.mount_widget(widget).and_then(|()| {
            if widget.binds_css_vars() {
                sdk.bind_css_vars(widget)
            } else {
                Ok(())
            }
        });
        log_outcome(WidgetOutcome::new(widget, result))
    }

    fn spawn_viewport(&self) -> PendingMount {
        let widget = WidgetKind::Viewport;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let err = McError::mount(widget.name(), "no async runtime to complete the mount");
            return PendingMount::done(log_outcome(WidgetOutcome::new(widget, Err(err))));
        };

        let sdk = Arc::clone(&self.sdk);
        PendingMount::from_task(runtime.spawn(async move {
            let result = match sdk.mount_viewport().await {
                Ok(()) => sdk.bind_css_vars(widget),
                Err(e) => Err(e),
            };
            log_outcome(WidgetOutcome::new(widget, result))
        }))
    }
}

fn log_outcome(outcome: WidgetOutcome) -> WidgetOutcome {
    match &outcome.result {
        Ok(()) => debug!("{} mounted", outcome.widget),
        Err(e) => error!("error mounting {}: {e}", outcome.widget),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use mc_models::{HostUser, LaunchParams};
    use tokio::sync::Notify;

    use crate::environment::{HostEnvironment, Viewport};
    use crate::mock::MockEnvironment;
    use crate::sdk::MiniAppSdk;
    use mc_core::config::MockProbe;

    /// Host SDK double with scripted failures and a gated viewport.
    #[derive(Default)]
    struct ScriptedSdk {
        fail_init: bool,
        fail_widgets: HashSet<WidgetKind>,
        viewport_gate: Option<Arc<Notify>>,
        mounted: Mutex<Vec<WidgetKind>>,
        debug: Mutex<Option<bool>>,
    }

    impl ScriptedSdk {
        fn mounted(&self) -> Vec<WidgetKind> {
            self.mounted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HostSdk for ScriptedSdk {
        async fn init(&self) -> McResult<()> {
            if self.fail_init {
                Err(McError::HostInitFailure("scripted".into()))
            } else {
                Ok(())
            }
        }

        fn set_debug(&self, enabled: bool) {
            *self.debug.lock().unwrap() = Some(enabled);
        }

        fn launch_params(&self) -> McResult<LaunchParams> {
            LaunchParams::parse("tgWebAppVersion=7.2&tgWebAppPlatform=ios&tgWebAppStartParam=debug")
        }

        fn mount_widget(&self, widget: WidgetKind) -> McResult<()> {
            if self.fail_widgets.contains(&widget) {
                return Err(McError::mount(widget.name(), "scripted"));
            }
            self.mounted.lock().unwrap().push(widget);
            Ok(())
        }

        async fn mount_viewport(&self) -> McResult<()> {
            if let Some(gate) = &self.viewport_gate {
                gate.notified().await;
            }
            if self.fail_widgets.contains(&WidgetKind::Viewport) {
                return Err(McError::mount("viewport", "scripted"));
            }
            self.mounted.lock().unwrap().push(WidgetKind::Viewport);
            Ok(())
        }

        fn bind_css_vars(&self, _widget: WidgetKind) -> McResult<()> {
            Ok(())
        }

        fn restore_init_data(&self) -> McResult<Option<InitData>> {
            Ok(Some(InitData {
                query_id: None,
                user: Some(HostUser {
                    id: 7,
                    first_name: "Grace".into(),
                    last_name: None,
                    username: None,
                    language_code: None,
                    is_premium: None,
                }),
                auth_date: chrono::Utc::now(),
                hash: "h".into(),
                start_param: None,
            }))
        }
    }

    fn bridge_with(sdk: ScriptedSdk) -> (PlatformBridge, Arc<ScriptedSdk>) {
        let sdk = Arc::new(sdk);
        (PlatformBridge::new(sdk.clone()), sdk)
    }

    #[tokio::test]
    async fn test_debug_from_start_param_in_production() {
        let (mut bridge, sdk) = bridge_with(ScriptedSdk::default());
        bridge.initialize(BuildMode::Production).await.unwrap();
        assert_eq!(*sdk.debug.lock().unwrap(), Some(true));
        assert_eq!(bridge.state(), BridgeState::Initialized { debug: true, host_ready: true });
    }

    #[tokio::test]
    async fn test_init_failure_is_fatal_in_production() {
        let (mut bridge, _) = bridge_with(ScriptedSdk { fail_init: true, ..Default::default() });
        let err = bridge.initialize(BuildMode::Production).await.unwrap_err();
        assert!(matches!(err, McError::HostInitFailure(_)));
        assert_eq!(bridge.state(), BridgeState::Failed);
        assert!(matches!(bridge.mount(), Err(McError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_init_failure_is_tolerated_in_development() {
        let (mut bridge, _) = bridge_with(ScriptedSdk { fail_init: true, ..Default::default() });
        bridge.initialize(BuildMode::Development).await.unwrap();
        assert_eq!(bridge.state(), BridgeState::Initialized { debug: true, host_ready: false });
    }

    #[tokio::test]
    async fn test_initialize_twice_is_rejected() {
        let (mut bridge, _) = bridge_with(ScriptedSdk::default());
        bridge.initialize(BuildMode::Production).await.unwrap();
        assert!(matches!(
            bridge.initialize(BuildMode::Production).await,
            Err(McError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_mount_requires_initialize_and_is_one_shot() {
        let (mut bridge, _) = bridge_with(ScriptedSdk::default());
        assert!(matches!(bridge.mount(), Err(McError::InvalidState(_))));
        bridge.initialize(BuildMode::Production).await.unwrap();
        let report = bridge.mount().unwrap();
        assert_eq!(report.user_id(), Some(7));
        assert_eq!(bridge.state(), BridgeState::Mounted);
        assert!(matches!(bridge.mount(), Err(McError::AlreadyMounted)));
        assert!(report.settle().await.all_mounted());
    }

    #[tokio::test]
    async fn test_mount_returns_before_viewport_completes() {
        let gate = Arc::new(Notify::new());
        let (mut bridge, sdk) = bridge_with(ScriptedSdk {
            viewport_gate: Some(gate.clone()),
            ..Default::default()
        });
        bridge.initialize(BuildMode::Production).await.unwrap();

        let report = bridge.mount().unwrap();
        assert_eq!(report.user_id(), Some(7));
        assert!(!report.viewport.is_finished());
        assert_eq!(
            sdk.mounted(),
            [WidgetKind::BackButton, WidgetKind::ThemeParams, WidgetKind::MiniApp]
        );

        gate.notify_one();
        let summary = tokio::time::timeout(Duration::from_secs(5), report.settle())
            .await
            .unwrap();
        assert!(summary.all_mounted());
        let order: Vec<WidgetKind> = summary.outcomes.iter().map(|o| o.widget).collect();
        assert_eq!(order, WidgetKind::ALL);
    }

    #[tokio::test]
    async fn test_viewport_failure_does_not_block_other_widgets() {
        let (mut bridge, sdk) = bridge_with(ScriptedSdk {
            fail_widgets: [WidgetKind::Viewport].into_iter().collect(),
            ..Default::default()
        });
        bridge.initialize(BuildMode::Production).await.unwrap();
        let summary = bridge.mount().unwrap().settle().await;

        assert_eq!(summary.failed(), [WidgetKind::Viewport]);
        assert_eq!(
            sdk.mounted(),
            [WidgetKind::BackButton, WidgetKind::ThemeParams, WidgetKind::MiniApp]
        );
    }

    #[tokio::test]
    async fn test_sync_widget_failures_are_contained() {
        for failing in [WidgetKind::BackButton, WidgetKind::ThemeParams, WidgetKind::MiniApp] {
            let (mut bridge, sdk) = bridge_with(ScriptedSdk {
                fail_widgets: [failing].into_iter().collect(),
                ..Default::default()
            });
            bridge.initialize(BuildMode::Production).await.unwrap();
            let report = bridge.mount().unwrap();
            assert!(report.session.is_some(), "session lost when {failing} failed");
            let summary = report.settle().await;

            assert_eq!(summary.failed(), [failing]);
            assert_eq!(sdk.mounted().len(), 3);
            assert!(!sdk.mounted().contains(&failing));
        }
    }

    #[test]
    fn test_viewport_without_runtime_is_reported_not_panicking() {
        let (mut bridge, _) = bridge_with(ScriptedSdk::default());
        bridge.state = BridgeState::Initialized { debug: false, host_ready: true };
        let report = bridge.mount().unwrap();
        assert!(report.viewport.is_finished());
        assert_eq!(report.outcomes.len(), 3);
    }

    #[tokio::test]
    async fn test_aborted_viewport_task_is_a_failed_mount() {
        let gate = Arc::new(Notify::new());
        let handle = tokio::spawn(async move {
            gate.notified().await;
            WidgetOutcome::new(WidgetKind::Viewport, Ok(()))
        });
        handle.abort();
        let outcome = PendingMount::from_task(handle).wait().await;
        assert_eq!(outcome.widget, WidgetKind::Viewport);
        assert!(outcome.failure().unwrap().contains("task aborted"));
    }

    #[tokio::test]
    async fn test_development_mock_reaches_mounted_without_real_host() {
        let env = HostEnvironment::detached();
        let mock = MockEnvironment::new();
        mock.install(&env, MockProbe::DetectAndSkip).unwrap();

        let sdk = Arc::new(MiniAppSdk::new(env.clone()));
        let mut bridge = PlatformBridge::new(sdk);
        bridge.initialize(BuildMode::Development).await.unwrap();
        assert_eq!(bridge.state(), BridgeState::Initialized { debug: true, host_ready: true });

        let report = bridge.mount().unwrap();
        assert_eq!(report.user_id(), Some(mc_core::constants::mock::USER_ID));
        let summary = report.settle().await;
        assert!(summary.all_mounted(), "failed: {:?}", summary.failed());
        assert_eq!(bridge.state(), BridgeState::Mounted);
        assert!(env.css_var("--tg-theme-bg-color").is_some());
        assert!(env.css_var("--tg-viewport-height").is_some());
    }

    #[tokio::test]
    async fn test_real_host_mounts_every_widget() {
        let env = HostEnvironment::hosted(MockEnvironment::new().launch_query().unwrap());
        env.report_viewport(Viewport::expanded(400, 700));
        let mut bridge = PlatformBridge::new(Arc::new(MiniAppSdk::new(env.clone())));
        bridge.initialize(BuildMode::Production).await.unwrap();
        let summary = bridge.mount().unwrap().settle().await;
        assert!(summary.all_mounted());
        assert!(env.posted("web_app_ready"));
    }
}
