//! Command-line interface for the Rigging tool server.

pub mod commands;

use clap::{Parser, Subcommand};

/// Rigging - agent tool services
///
/// Serves web search, weather, notebook and SQLite tools to an agent
/// dispatcher over MCP (JSON-RPC 2.0 on stdio).
#[derive(Parser, Debug)]
#[command(name = "rigging")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "RIGGING_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the tools over stdio (default)
    Serve,

    /// Print the tool catalog as JSON
    Tools,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration with API keys redacted
    Show,

    /// Print the default configuration file path
    Path,
}
