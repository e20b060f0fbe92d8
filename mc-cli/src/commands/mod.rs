//! CLI command implementations.

pub mod config;
pub mod run;
pub mod status;

use std::sync::Arc;
use std::time::Duration;

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use mc_core::config::ConfigHandle;
use mc_core::error::McResult;
use mc_host::{HostEnvironment, MountSummary, Viewport};
use mc_services::AppRoot;
use mc_sync::MemoryProvider;

/// Rows and columns assumed when no terminal is attached.
const FALLBACK_TERMINAL_SIZE: (u16, u16) = (24, 80);

/// Build the host environment from the configured launch data.
///
/// The terminal plays the host's viewport: its size is reported up front.
pub fn host_environment(launch_params: &str) -> HostEnvironment {
    let env = if launch_params.trim().is_empty() {
        HostEnvironment::detached()
    } else {
        HostEnvironment::hosted(launch_params.trim())
    };
    env.report_viewport(terminal_viewport());
    env
}

/// The terminal size as a viewport. Stdout is usually piped for JSON
/// output, so stderr is tried next before falling back to a fixed size.
fn terminal_viewport() -> Viewport {
    let (rows, cols) = Term::stdout()
        .size_checked()
        .or_else(|| Term::stderr().size_checked())
        .unwrap_or_else(|| {
            debug!("no terminal attached, using default viewport");
            FALLBACK_TERMINAL_SIZE
        });
    debug!("terminal viewport {cols}x{rows}");
    Viewport::expanded(u32::from(cols), u32::from(rows))
}

/// Compose the application root from config.
pub async fn compose_app(config: &ConfigHandle) -> McResult<AppRoot> {
    let cfg = config.snapshot().await;
    let env = host_environment(&cfg.host.launch_params);
    let provider = Arc::new(MemoryProvider::with_capacity(cfg.sync.event_capacity));
    AppRoot::new(cfg, env, provider)
}

/// Spinner shown while the application starts.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Table of host widget outcomes in mount order.
pub fn widget_table(summary: &MountSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Widget", "Status", "Detail"]);

    for outcome in &summary.outcomes {
        let (status, detail) = match outcome.failure() {
            None => (style("mounted").green().to_string(), String::new()),
            Some(reason) => (style("failed").red().to_string(), truncate(&reason, 60)),
        };
        table.add_row(vec![outcome.widget.to_string(), status, detail]);
    }
    table
}

/// Truncate a string to a maximum number of characters, appending an
/// ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
