//! Rigging tool server entry point.

use anyhow::Result;
use clap::Parser;
use rigging::cli::{commands, Cli, Commands};
use rigging::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // -v flags win over the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    // stdout carries JSON-RPC, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("rigging={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match &cli.command {
        None | Some(Commands::Serve) => {
            commands::run_serve(settings).await?;
        }

        Some(Commands::Tools) => {
            commands::run_tools()?;
        }

        Some(Commands::Config { action }) => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
