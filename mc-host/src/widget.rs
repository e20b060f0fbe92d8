//! Host widgets and the outcome of mounting each one.

use mc_core::error::McResult;

/// The host-provided UI pieces the bridge mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WidgetKind {
    /// Native navigation back control.
    BackButton,
    /// Host colour palette.
    ThemeParams,
    /// Viewport size tracking. Mounted asynchronously.
    Viewport,
    /// Top-level mini-app chrome (header and background colours).
    MiniApp,
}

impl WidgetKind {
    /// All widgets, in mount order.
    pub const ALL: [WidgetKind; 4] = [
        WidgetKind::BackButton,
        WidgetKind::ThemeParams,
        WidgetKind::Viewport,
        WidgetKind::MiniApp,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BackButton => "back_button",
            Self::ThemeParams => "theme_params",
            Self::Viewport => "viewport",
            Self::MiniApp => "mini_app",
        }
    }

    /// Whether the widget publishes CSS variables after mounting.
    pub fn binds_css_vars(&self) -> bool {
        !matches!(self, Self::BackButton)
    }

    /// Whether the host completes this mount asynchronously.
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Viewport)
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Result of mounting one widget.
#[derive(Debug)]
pub struct WidgetOutcome {
    pub widget: WidgetKind,
    pub result: McResult<()>,
}

impl WidgetOutcome {
    pub fn new(widget: WidgetKind, result: McResult<()>) -> Self {
        Self { widget, result }
    }

    pub fn is_mounted(&self) -> bool {
        self.result.is_ok()
    }

    /// Failure message, if the mount failed.
    pub fn failure(&self) -> Option<String> {
        self.result.as_ref().err().map(|e| e.to_string())
    }
}

impl std::fmt::Display for WidgetOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.result {
            Ok(()) => write!(f, "{}: mounted", self.widget),
            Err(e) => write!(f, "{}: failed ({e})", self.widget),
        }
    }
}
