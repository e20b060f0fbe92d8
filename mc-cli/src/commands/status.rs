//! Status command - start the application once and report its state.

use console::style;

use mc_core::config::ConfigHandle;
use mc_core::error::McResult;
use mc_services::{should_show_auth_overlay, AppRoot};

use crate::OutputFormat;

/// Run the status command.
pub async fn run(config: ConfigHandle, format: OutputFormat) -> McResult<()> {
    let mut app = super::compose_app(&config).await?;

    let pb = super::spinner("Starting...");
    let started = app.start().await;
    pb.finish_and_clear();

    let result = match started {
        Ok(report) => {
            let summary = report.settle().await;
            print_status(&app, Some(&summary), None, format).await?;
            Ok(())
        }
        Err(e) => {
            print_status(&app, None, Some(&e.to_string()), format).await?;
            Err(e)
        }
    };

    app.shutdown().await?;
    result
}

async fn print_status(
    app: &AppRoot,
    summary: Option<&mc_host::MountSummary>,
    error: Option<&str>,
    format: OutputFormat,
) -> McResult<()> {
    let auth = app.auth().read().await.current();
    let user = summary
        .and_then(|s| s.session.as_ref())
        .and_then(|session| session.user.as_ref());

    match format {
        OutputFormat::Json => {
            let widgets: Vec<_> = summary
                .map(|s| {
                    s.outcomes
                        .iter()
                        .map(|o| {
                            serde_json::json!({
                                "widget": o.widget.name(),
                                "mounted": o.is_mounted(),
                                "error": o.failure(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            let json = serde_json::json!({
                "mode": app.mode().name(),
                "phase": app.phase().to_string(),
                "error": error,
                "host": {
                    "bridge": app.bridge_state().to_string(),
                    "hosted": app.environment().is_hosted(),
                    "mocked": app.environment().is_mocked(),
                    "user_id": user.map(|u| u.id),
                    "widgets": widgets,
                },
                "sync": {
                    "peer": app.context().endpoint().to_string(),
                    "state": app.context().connection_state().to_string(),
                },
                "auth": {
                    "state": auth.state,
                    "existing_users": &auth.existing_users,
                    "show_overlay": should_show_auth_overlay(&auth),
                },
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("{}", style("Application").bold().underlined());
            println!("  Mode:      {}", app.mode());
            let phase = match error {
                None => style(app.phase().to_string()).green().to_string(),
                Some(_) => style(app.phase().to_string()).red().to_string(),
            };
            println!("  Phase:     {phase}");
            if let Some(error) = error {
                println!("  Error:     {}", style(error).red());
            }

            println!();
            println!("{}", style("Host").bold().underlined());
            println!("  Bridge:    {}", app.bridge_state());
            let source = if app.environment().is_mocked() {
                style("mock").yellow().to_string()
            } else if app.environment().is_hosted() {
                "launch params".to_string()
            } else {
                style("none").red().to_string()
            };
            println!("  Source:    {source}");
            if let Some(user) = user {
                println!("  User:      {} ({})", user.display_name(), user.id);
            }
            if let Some(summary) = summary {
                println!("{}", super::widget_table(summary));
            }

            println!();
            println!("{}", style("Sync").bold().underlined());
            println!("  Peer:      {}", app.context().endpoint());
            println!("  State:     {}", app.context().connection_state());

            println!();
            println!("{}", style("Auth").bold().underlined());
            println!("  State:     {}", auth.state);
            println!("  Users:     {}", auth.existing_users.len());
        }
    }
    Ok(())
}
