//! In-memory configuration store.

use std::sync::RwLock;

use async_trait::async_trait;

use super::ConfigStore;
use crate::{AgentSettings, SettingsError};

/// In-memory store.
///
/// Useful for tests and for running the settings surface without a backend.
/// Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: RwLock<AgentSettings>,
}

impl MemoryStore {
    /// Create a store holding the given configuration.
    #[must_use]
    pub fn new(settings: AgentSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self) -> Result<AgentSettings, SettingsError> {
        Ok(self
            .settings
            .read()
            .map_err(|e| SettingsError::Internal(e.to_string()))?
            .clone())
    }

    async fn set(&self, settings: &AgentSettings) -> Result<(), SettingsError> {
        *self
            .settings
            .write()
            .map_err(|e| SettingsError::Internal(e.to_string()))? = settings.clone();
        Ok(())
    }
}
