//! Host SDK capability set and its environment-backed implementation.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use mc_core::constants;
use mc_core::error::{McError, McResult};
use mc_models::{InitData, LaunchParams};

use crate::environment::HostEnvironment;
use crate::widget::WidgetKind;

/// What the application consumes from the host platform SDK.
///
/// Every widget operation returns a result so the bridge can contain
/// failures per widget.
#[async_trait]
pub trait HostSdk: Send + Sync {
    /// Bootstrap the SDK against the host.
    async fn init(&self) -> McResult<()>;

    /// Toggle verbose host event logging.
    fn set_debug(&self, enabled: bool);

    /// Launch parameters the host supplied.
    fn launch_params(&self) -> McResult<LaunchParams>;

    /// Mount a widget whose mount completes synchronously.
    fn mount_widget(&self, widget: WidgetKind) -> McResult<()>;

    /// Mount the viewport; completes once the host reports its size.
    async fn mount_viewport(&self) -> McResult<()>;

    /// Publish a mounted widget's state as CSS variables.
    fn bind_css_vars(&self, widget: WidgetKind) -> McResult<()>;

    /// Restore the session data the host launched us with.
    fn restore_init_data(&self) -> McResult<Option<InitData>>;
}

/// `HostSdk` implementation driven by a [`HostEnvironment`].
pub struct MiniAppSdk {
    env: HostEnvironment,
    initialized: AtomicBool,
    mounted: Mutex<BTreeSet<WidgetKind>>,
}

impl MiniAppSdk {
    pub fn new(env: HostEnvironment) -> Self {
        Self {
            env,
            initialized: AtomicBool::new(false),
            mounted: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.env
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn is_mounted(&self, widget: WidgetKind) -> bool {
        self.mounted_set().contains(&widget)
    }

    fn mounted_set(&self) -> std::sync::MutexGuard<'_, BTreeSet<WidgetKind>> {
        self.mounted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn require_initialized(&self, widget: WidgetKind) -> McResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(McError::mount(widget.name(), "host sdk not initialized"))
        }
    }

    fn require_mounted(&self, widget: WidgetKind) -> McResult<()> {
        if self.is_mounted(widget) {
            Ok(())
        } else {
            Err(McError::mount(widget.name(), "cannot bind css vars before mount"))
        }
    }

    fn mark_mounted(&self, widget: WidgetKind) {
        self.mounted_set().insert(widget);
        debug!("{widget} mounted");
    }
}

#[async_trait]
impl HostSdk for MiniAppSdk {
    async fn init(&self) -> McResult<()> {
        if !self.env.is_hosted() {
            return Err(McError::HostInitFailure(
                "no launch parameters found; not running inside a host".into(),
            ));
        }
        let params = self
            .launch_params()
            .map_err(|e| McError::HostInitFailure(e.to_string()))?;

        self.env.post_event("iframe_ready", json!({ "reload_supported": false }));
        self.initialized.store(true, Ordering::Release);
        info!(
            "host sdk initialized (platform={}, version={}, mocked={})",
            params.platform,
            params.version,
            self.env.is_mocked()
        );
        Ok(())
    }

    fn set_debug(&self, enabled: bool) {
        self.env.set_debug(enabled);
        debug!("host sdk debug mode: {enabled}");
    }

    fn launch_params(&self) -> McResult<LaunchParams> {
        let raw = self
            .env
            .launch_params_raw()
            .ok_or_else(|| McError::LaunchParams("host supplied no launch parameters".into()))?;
        LaunchParams::parse(&raw)
    }

    fn mount_widget(&self, widget: WidgetKind) -> McResult<()> {
        self.require_initialized(widget)?;
        match widget {
            WidgetKind::BackButton => {
                self.env
                    .post_event("web_app_setup_back_button", json!({ "is_visible": false }));
            }
            WidgetKind::ThemeParams => {
                self.launch_params()
                    .map_err(|e| McError::mount(widget.name(), e.to_string()))?;
                self.env.post_event("web_app_request_theme", json!({}));
            }
            WidgetKind::MiniApp => {
                self.env.post_event("web_app_ready", json!({}));
            }
            WidgetKind::Viewport => {
                return Err(McError::mount(widget.name(), "viewport mounts asynchronously"));
            }
        }
        self.mark_mounted(widget);
        Ok(())
    }

    async fn mount_viewport(&self) -> McResult<()> {
        let widget = WidgetKind::Viewport;
        self.require_initialized(widget)?;
        self.env.post_event("web_app_request_viewport", json!({}));
        // The host answers on its own schedule.
        tokio::task::yield_now().await;
        if self.env.viewport().is_none() {
            return Err(McError::mount(widget.name(), "host did not report a viewport"));
        }
        self.mark_mounted(widget);
        Ok(())
    }

    fn bind_css_vars(&self, widget: WidgetKind) -> McResult<()> {
        self.require_mounted(widget)?;
        match widget {
            WidgetKind::ThemeParams => {
                let theme = self
                    .launch_params()
                    .map_err(|e| McError::mount(widget.name(), e.to_string()))?
                    .theme_params;
                for (name, value) in theme.css_vars() {
                    self.env.set_css_var(name, value);
                }
            }
            WidgetKind::Viewport => {
                let viewport = self
                    .env
                    .viewport()
                    .ok_or_else(|| McError::mount(widget.name(), "viewport size unknown"))?;
                let prefix = constants::VIEWPORT_CSS_PREFIX;
                self.env.set_css_var(format!("{prefix}width"), format!("{}px", viewport.width));
                self.env.set_css_var(format!("{prefix}height"), format!("{}px", viewport.height));
                self.env.set_css_var(
                    format!("{prefix}stable-height"),
                    format!("{}px", viewport.stable_height),
                );
            }
            WidgetKind::MiniApp => {
                let theme = self
                    .launch_params()
                    .map_err(|e| McError::mount(widget.name(), e.to_string()))?
                    .theme_params;
                if let Some(bg) = theme.bg_color.as_ref() {
                    self.env.set_css_var("--tg-bg-color", bg.clone());
                }
                if let Some(header) = theme.header_bg_color.as_ref().or(theme.bg_color.as_ref()) {
                    self.env.set_css_var("--tg-header-color", header.clone());
                }
            }
            WidgetKind::BackButton => {
                return Err(McError::mount(widget.name(), "back button has no css vars"));
            }
        }
        Ok(())
    }

    fn restore_init_data(&self) -> McResult<Option<InitData>> {
        self.launch_params()?.init_data()
    }
}
