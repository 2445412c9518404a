//! `goku config` subcommands.

use std::io::Write;

use anyhow::Context;
use goku_settings::{ConfigStore, KEYS};

use crate::cli::ConfigAction;

/// Run a config action against `store`, printing to `out`.
pub async fn run(
    store: &dyn ConfigStore,
    action: ConfigAction,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show { reveal } => show(store, reveal, out).await,
        ConfigAction::Set { key, value } => set(store, &key, value, out).await,
    }
}

async fn show(store: &dyn ConfigStore, reveal: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let settings = store.get().await.context("Failed to fetch configuration")?;

    let rows: Vec<(&str, String)> = if reveal {
        KEYS.iter()
            .filter_map(|&key| Some((key, settings.get(key).ok()?.to_owned())))
            .collect()
    } else {
        settings.masked()
    };

    let width = KEYS.iter().map(|k| k.len()).max().unwrap_or_default();
    for (key, value) in rows {
        let value = if value.is_empty() { "(not set)" } else { &value };
        writeln!(out, "{key:<width$}  {value}")?;
    }
    Ok(())
}

async fn set(
    store: &dyn ConfigStore,
    key: &str,
    value: String,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut settings = store.get().await.context("Failed to fetch configuration")?;
    settings.set(key, value)?;
    store
        .set(&settings)
        .await
        .context("Failed to persist configuration")?;

    tracing::info!(key, "Configuration updated");
    writeln!(out, "Updated {key}")?;
    Ok(())
}
