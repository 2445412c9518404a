//! Configuration store backed by the agent backend's HTTP API.

use async_trait::async_trait;
use serde::Deserialize;

use super::ConfigStore;
use crate::{AgentSettings, SettingsError};

/// Backend HTTP API when run locally.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Deserialize)]
struct Health {
    status: String,
}

/// Talks to `GET /config` and `POST /config` on the backend.
#[derive(Debug, Clone)]
pub struct HttpConfigStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpConfigStore {
    /// Create a store for the backend at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a store sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    /// Backend address, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Whether the backend reports itself healthy.
    ///
    /// # Errors
    /// Returns error if the backend cannot be reached.
    pub async fn health(&self) -> Result<bool, SettingsError> {
        let response = self.client.get(self.url("/health")).send().await?;
        let health: Health = check(response).await?.json().await?;
        Ok(health.status == "healthy")
    }
}

impl Default for HttpConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, SettingsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SettingsError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ConfigStore for HttpConfigStore {
    async fn get(&self) -> Result<AgentSettings, SettingsError> {
        tracing::debug!(url = %self.base_url, "Fetching configuration");
        let response = self.client.get(self.url("/config")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn set(&self, settings: &AgentSettings) -> Result<(), SettingsError> {
        tracing::debug!(url = %self.base_url, "Persisting configuration");
        let response = self
            .client
            .post(self.url("/config"))
            .json(settings)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
