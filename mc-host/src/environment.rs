//! The surface a host platform exposes to an embedded mini-app.
//!
//! A `HostEnvironment` carries the raw launch data, the latest viewport the
//! host reported, the CSS variables bound by mounted widgets, and a log of
//! events posted back to the host. Clones share the same state.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub stable_height: u32,
    pub is_expanded: bool,
}

impl Viewport {
    /// A fully expanded viewport of the given size.
    pub fn expanded(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stable_height: height,
            is_expanded: true,
        }
    }
}

/// An event the mini-app posted to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostEvent {
    pub name: String,
    pub payload: serde_json::Value,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct EnvState {
    launch_params_raw: Option<String>,
    mocked: bool,
    viewport: Option<Viewport>,
    css_vars: BTreeMap<String, String>,
    events: Vec<HostEvent>,
    debug: bool,
}

/// Shared handle to the host environment.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    inner: Arc<Mutex<EnvState>>,
}

impl HostEnvironment {
    /// An environment with no host attached.
    pub fn detached() -> Self {
        Self::default()
    }

    /// An environment whose host handed over `launch_params_raw`.
    pub fn hosted(launch_params_raw: impl Into<String>) -> Self {
        let env = Self::default();
        env.state().launch_params_raw = Some(launch_params_raw.into());
        env
    }

    fn state(&self) -> MutexGuard<'_, EnvState> {
        // The state is plain data; a panic mid-update cannot leave it torn.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Probe: does this process run inside a host that supplied launch data?
    pub fn is_hosted(&self) -> bool {
        self.state()
            .launch_params_raw
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty())
    }

    /// Whether the launch data came from the development mock.
    pub fn is_mocked(&self) -> bool {
        self.state().mocked
    }

    pub fn launch_params_raw(&self) -> Option<String> {
        self.state().launch_params_raw.clone()
    }

    /// Replace the launch data. `mocked` marks synthetic data.
    pub fn inject_launch_params(&self, raw: impl Into<String>, mocked: bool) {
        let mut state = self.state();
        state.launch_params_raw = Some(raw.into());
        state.mocked = mocked;
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.state().viewport
    }

    /// Record a viewport report from the host.
    pub fn report_viewport(&self, viewport: Viewport) {
        debug!(
            "viewport reported: {}x{} (expanded: {})",
            viewport.width, viewport.height, viewport.is_expanded
        );
        self.state().viewport = Some(viewport);
    }

    pub fn set_css_var(&self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        trace!("css var {name} = {value}");
        self.state().css_vars.insert(name, value);
    }

    pub fn css_var(&self, name: &str) -> Option<String> {
        self.state().css_vars.get(name).cloned()
    }

    /// All bound CSS variables, sorted by name.
    pub fn css_vars(&self) -> BTreeMap<String, String> {
        self.state().css_vars.clone()
    }

    pub fn set_debug(&self, enabled: bool) {
        self.state().debug = enabled;
    }

    pub fn is_debug(&self) -> bool {
        self.state().debug
    }

    /// Post an event to the host.
    pub fn post_event(&self, name: &str, payload: serde_json::Value) {
        let mut state = self.state();
        if state.debug {
            debug!("host event -> {name} {payload}");
        }
        state.events.push(HostEvent {
            name: name.to_string(),
            payload,
            at: Utc::now(),
        });
    }

    /// Events posted so far, oldest first.
    pub fn events(&self) -> Vec<HostEvent> {
        self.state().events.clone()
    }

    pub fn posted(&self, name: &str) -> bool {
        self.state().events.iter().any(|e| e.name == name)
    }
}
