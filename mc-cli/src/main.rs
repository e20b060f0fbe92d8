//! MiniChat CLI - terminal client for the chat mini-app.
//!
//! Runs the application root against launch data handed over by the host
//! (or the mock host in development builds) and renders the chat log in
//! the terminal.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use mc_core::config::{AppConfig, ConfigHandle};
use mc_core::error::McResult;
use mc_core::logging;
use mc_core::platform::BuildMode;

/// MiniChat - a minimal real-time chat.
#[derive(Parser)]
#[command(
    name = "minichat",
    version,
    about = "MiniChat terminal client",
    long_about = "A terminal client for the MiniChat mini-app.\n\
                  Messages replicate through the configured sync peer."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Launch parameters from the host, in query-string form (overrides config).
    #[arg(long, global = true)]
    launch_params: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a chat and start sending messages.
    Run {
        /// Chat to open (a new chat is created when omitted).
        #[arg(long)]
        chat: Option<String>,
        /// Sign up or log in as this user without prompting.
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Start the application once and report bridge, sync and auth state.
    Status,
    /// Show or initialize the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> McResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_config_path()?,
    };
    let mut config = if config_path.exists() {
        AppConfig::load_from_file(&config_path)?
    } else {
        AppConfig::default()
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    // Initialize logging
    let log_dir = config
        .effective_log_dir()
        .unwrap_or_else(|_| PathBuf::from("logs"));
    let _guard = logging::init_logging(&config.logging, &log_dir)?;

    info!(
        "MiniChat CLI v{} ({} build)",
        mc_core::constants::APP_VERSION,
        BuildMode::current()
    );

    let config_handle = ConfigHandle::new(config);
    if let Some(raw) = cli.launch_params {
        config_handle.write().await.host.launch_params = raw;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Run { chat, username } => {
            commands::run::run(config_handle, chat, username).await
        }
        Commands::Status => commands::status::run(config_handle, cli.format).await,
        Commands::Config { action } => {
            commands::config::run(config_handle, config_path, action, cli.format).await
        }
    }
}
