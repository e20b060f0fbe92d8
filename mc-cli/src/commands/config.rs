//! Config commands.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;

use mc_core::config::{AppConfig, ConfigHandle};
use mc_core::error::{McError, McResult};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the configuration file path.
    Path,
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(
    config: ConfigHandle,
    path: PathBuf,
    action: ConfigAction,
    format: OutputFormat,
) -> McResult<()> {
    match action {
        ConfigAction::Show => {
            let cfg = config.read().await;
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&*cfg)?;
                    println!("{json}");
                }
                OutputFormat::Text => print_config_text(&cfg),
            }
        }
        ConfigAction::Path => match format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "path": path.display().to_string(),
                    "exists": path.exists(),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Text => println!("{}", path.display()),
        },
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(McError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            AppConfig::default().save_to_file(&path)?;
            println!(
                "  {} Wrote default configuration to {}",
                style("OK").green().bold(),
                path.display()
            );
        }
    }
    Ok(())
}

fn print_config_text(cfg: &AppConfig) {
    println!("{}", style("Sync").bold().underlined());
    println!("  sync.peer                 {}", cfg.sync.peer);
    println!("  sync.event_capacity       {}", cfg.sync.event_capacity);

    println!();
    println!("{}", style("Host").bold().underlined());
    let launch = if cfg.has_launch_params() {
        super::truncate(&cfg.host.launch_params, 48)
    } else {
        style("(not hosted)").dim().to_string()
    };
    println!("  host.launch_params        {launch}");
    println!("  host.mock_probe           {:?}", cfg.host.mock_probe);

    println!();
    println!("{}", style("Logging").bold().underlined());
    println!("  logging.level             {}", cfg.logging.level);
    println!("  logging.directory         {}", cfg.logging.directory);
    println!("  logging.json_output       {}", cfg.logging.json_output);

    println!();
    println!("{}", style("Display").bold().underlined());
    println!("  display.show_timestamps   {}", cfg.display.show_timestamps);
    println!("  display.use_24hr_format   {}", cfg.display.use_24hr_format);
    println!("  display.history_limit     {}", cfg.display.history_limit);
}
