//! gridctl - Entry Point

use anyhow::Result;
use clap::Parser;
use gridctl_app::config::DEFAULT_CONFIG_PATH;
use gridctl_app::{AppConfig, Application, Command};
use tracing::{debug, info};

/// Control grid-bot symbol lifecycles across exchanges
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via GRIDCTL_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > GRIDCTL_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("GRIDCTL_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = AppConfig::load(&config_path)?;
    gridctl_telemetry::init_logging_with(&config.telemetry.log_level)?;
    debug!(config_path = %config_path, api_url = %config.api_url, "Configuration loaded");

    if args.command == Command::Serve {
        info!("Starting gridctl v{}", env!("CARGO_PKG_VERSION"));
    }

    let app = Application::new(config)?;
    let output = app.run(args.command).await?;
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
