//! Backend configuration fields.

use serde::{Deserialize, Serialize};

use crate::SettingsError;

/// Local model engine used when no override is configured.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Model override meaning "let the router decide".
pub const DEFAULT_MODEL: &str = "default";

/// Keys understood by the backend, in display order.
pub const KEYS: [&str; 6] = [
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "HF_TOKEN",
    "GITHUB_TOKEN",
    "OLLAMA_BASE_URL",
    "GOKU_MODEL",
];

/// Configuration held by the backend's configuration store.
///
/// Serialized with the backend's key names. Missing credentials read as
/// empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(rename = "OPENAI_API_KEY", default)]
    pub openai_api_key: String,
    #[serde(rename = "ANTHROPIC_API_KEY", default)]
    pub anthropic_api_key: String,
    #[serde(rename = "HF_TOKEN", default)]
    pub hf_token: String,
    #[serde(rename = "GITHUB_TOKEN", default)]
    pub github_token: String,
    #[serde(rename = "OLLAMA_BASE_URL", default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    #[serde(rename = "GOKU_MODEL", default = "default_model")]
    pub model: String,
}

fn default_ollama_base_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.to_owned()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            hf_token: String::new(),
            github_token: String::new(),
            ollama_base_url: default_ollama_base_url(),
            model: default_model(),
        }
    }
}

impl AgentSettings {
    /// Read a field by its backend key.
    ///
    /// # Errors
    /// Returns [`SettingsError::UnknownKey`] for keys outside [`KEYS`].
    pub fn get(&self, key: &str) -> Result<&str, SettingsError> {
        let field = match key {
            "OPENAI_API_KEY" => &self.openai_api_key,
            "ANTHROPIC_API_KEY" => &self.anthropic_api_key,
            "HF_TOKEN" => &self.hf_token,
            "GITHUB_TOKEN" => &self.github_token,
            "OLLAMA_BASE_URL" => &self.ollama_base_url,
            "GOKU_MODEL" => &self.model,
            _ => return Err(SettingsError::UnknownKey(key.to_owned())),
        };
        Ok(field.as_str())
    }

    /// Replace a field by its backend key.
    ///
    /// # Errors
    /// Returns [`SettingsError::UnknownKey`] for keys outside [`KEYS`].
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), SettingsError> {
        let field = match key {
            "OPENAI_API_KEY" => &mut self.openai_api_key,
            "ANTHROPIC_API_KEY" => &mut self.anthropic_api_key,
            "HF_TOKEN" => &mut self.hf_token,
            "GITHUB_TOKEN" => &mut self.github_token,
            "OLLAMA_BASE_URL" => &mut self.ollama_base_url,
            "GOKU_MODEL" => &mut self.model,
            _ => return Err(SettingsError::UnknownKey(key.to_owned())),
        };
        *field = value.into();
        Ok(())
    }

    /// Key/value pairs for display, with credentials masked.
    #[must_use]
    pub fn masked(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|&key| {
                let value = self.get(key).ok()?;
                let shown = if is_secret(key) {
                    mask_value(value)
                } else {
                    value.to_owned()
                };
                Some((key, shown))
            })
            .collect()
    }
}

/// Whether a key holds a credential.
#[must_use]
pub fn is_secret(key: &str) -> bool {
    key.ends_with("_KEY") || key.ends_with("_TOKEN")
}

/// Hide the middle of a credential, keeping four characters at each end.
#[must_use]
pub fn mask_value(value: &str) -> String {
    let len = value.chars().count();
    if len < 8 {
        return "****".to_owned();
    }
    let head: String = value.chars().take(4).collect();
    let tail: String = value.chars().skip(len - 4).collect();
    format!("{head}{}{tail}", "•".repeat(len - 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_payload_gets_defaults() {
        let settings: AgentSettings =
            serde_json::from_str(r#"{"OPENAI_API_KEY":"sk-test"}"#).unwrap();
        assert_eq!(settings.openai_api_key, "sk-test");
        assert_eq!(settings.anthropic_api_key, "");
        assert_eq!(settings.ollama_base_url, DEFAULT_OLLAMA_BASE_URL);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_serializes_with_backend_keys() {
        let json = serde_json::to_value(AgentSettings::default()).unwrap();
        let object = json.as_object().unwrap();
        for key in KEYS {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(object.len(), KEYS.len());
    }

    #[test]
    fn test_get_and_set_by_key() {
        let mut settings = AgentSettings::default();
        settings.set("GOKU_MODEL", "ollama/llama3").unwrap();
        assert_eq!(settings.model, "ollama/llama3");
        assert_eq!(settings.get("GOKU_MODEL").unwrap(), "ollama/llama3");

        assert!(matches!(
            settings.set("PATH", "/bin"),
            Err(SettingsError::UnknownKey(key)) if key == "PATH"
        ));
        assert!(settings.get("PATH").is_err());
    }

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value(""), "****");
        assert_eq!(mask_value("short"), "****");
        assert_eq!(mask_value("12345678"), "12345678");
        assert_eq!(mask_value("sk-abcdefgh1234"), "sk-a•••••••1234");
    }

    #[test]
    fn test_masked_hides_only_credentials() {
        let mut settings = AgentSettings::default();
        settings.github_token = "ghp_0123456789".into();
        let masked = settings.masked();

        assert_eq!(masked.len(), KEYS.len());
        assert!(masked.contains(&("GITHUB_TOKEN", "ghp_••••••6789".to_owned())));
        assert!(masked.contains(&("OPENAI_API_KEY", "****".to_owned())));
        assert!(masked.contains(&("OLLAMA_BASE_URL", DEFAULT_OLLAMA_BASE_URL.to_owned())));
    }
}
