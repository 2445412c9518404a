//! `goku status` subcommand.

use std::io::Write;

use anyhow::Context;
use goku_settings::{ConfigStore, HttpConfigStore, KEYS, is_secret};

/// Print backend health, then the model setup if the backend is reachable.
///
/// An unreachable backend is reported, not treated as an error.
pub async fn run(store: &HttpConfigStore, out: &mut impl Write) -> anyhow::Result<()> {
    let url = store.base_url();
    let healthy = match store.health().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!(url, "Health check failed: {e}");
            writeln!(out, "Backend  {url} (offline)")?;
            return Ok(());
        }
    };
    let state = if healthy { "healthy" } else { "unhealthy" };
    writeln!(out, "Backend  {url} ({state})")?;

    let settings = store.get().await.context("Failed to fetch configuration")?;
    writeln!(out, "Model    {}", settings.model)?;
    writeln!(out, "Engine   {}", settings.ollama_base_url)?;

    let credentials: Vec<&str> = KEYS
        .iter()
        .copied()
        .filter(|&key| is_secret(key) && settings.get(key).is_ok_and(|v| !v.is_empty()))
        .collect();
    if credentials.is_empty() {
        writeln!(out, "Keys     none (local engine only)")?;
    } else {
        writeln!(out, "Keys     {}", credentials.join(", "))?;
    }
    Ok(())
}
