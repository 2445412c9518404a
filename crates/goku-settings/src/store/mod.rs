//! Configuration store implementations.

use async_trait::async_trait;

use crate::{AgentSettings, SettingsError};

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

#[cfg(feature = "http")]
pub use http::HttpConfigStore;

/// Request/response access to the backend configuration.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the current configuration.
    async fn get(&self) -> Result<AgentSettings, SettingsError>;

    /// Persist a full replacement of the configuration.
    async fn set(&self, settings: &AgentSettings) -> Result<(), SettingsError>;
}
