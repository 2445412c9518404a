//! Client for the agent backend's configuration store.
//!
//! Provides:
//! - `AgentSettings` - Credentials, model override and local engine URL
//! - `ConfigStore` - get / full-replacement set
//! - Store implementations (memory, HTTP)

pub mod settings;
pub mod store;

pub use settings::{AgentSettings, KEYS, is_secret, mask_value};
pub use store::ConfigStore;

#[cfg(feature = "memory")]
pub use store::MemoryStore;

#[cfg(feature = "http")]
pub use store::{HttpConfigStore, http::DEFAULT_API_URL};

/// Settings error.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Backend rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Settings error: {0}")]
    Internal(String),
}
