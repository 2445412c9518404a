//! Terminal client for the Goku agent.
//!
//! Run with: cargo run -p goku-cli -- chat
//!
//! The backend must be listening on ws://127.0.0.1:8000/ws/chat, or pass `--url`.

mod chat;
mod cli;
mod config_cmd;
mod status_cmd;

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use goku_settings::HttpConfigStore;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Chat(args) => {
            // The dashboard owns the terminal, so logs go to a file.
            let path = args.log_file.clone().unwrap_or_else(default_log_file);
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Arc::new(file))
                        .with_ansi(false),
                )
                .with(env_filter())
                .init();

            chat::run(args).await
        }
        Command::Config { api_url, action } => {
            init_stderr_logging();
            let store = HttpConfigStore::new(api_url);
            config_cmd::run(&store, action, &mut std::io::stdout()).await
        }
        Command::Status { api_url } => {
            init_stderr_logging();
            status_cmd::run(&HttpConfigStore::new(api_url), &mut std::io::stdout()).await
        }
    }
}

fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter())
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
}

fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("goku")
        .join("goku.log")
}
