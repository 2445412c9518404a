//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use goku_settings::DEFAULT_API_URL;
use goku_transport::DEFAULT_ENDPOINT;

/// Reconnect delay used when none is configured, in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

#[derive(Debug, Parser)]
#[command(name = "goku", version, about = "Terminal client for the Goku agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the chat dashboard.
    Chat(ChatArgs),
    /// Inspect or change the backend configuration.
    Config {
        /// Backend HTTP API.
        #[arg(long, env = "GOKU_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check the backend and show the active model setup.
    Status {
        /// Backend HTTP API.
        #[arg(long, env = "GOKU_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Backend chat endpoint.
    #[arg(long, env = "GOKU_WS_URL", default_value = DEFAULT_ENDPOINT)]
    pub url: String,

    /// Wait between reconnection attempts.
    #[arg(long, env = "GOKU_RECONNECT_DELAY_MS", default_value_t = DEFAULT_RECONNECT_DELAY_MS)]
    pub reconnect_delay_ms: u64,

    /// Where to write logs while the dashboard owns the terminal.
    #[arg(long, env = "GOKU_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration.
    Show {
        /// Print credentials in full.
        #[arg(long)]
        reveal: bool,
    },
    /// Change one key and persist the result.
    Set { key: String, value: String },
}
