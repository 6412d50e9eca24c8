use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DEFAULT_BASE_URL, EXPORT_FILENAME, HISTORY_STORAGE_KEY, THEME_STORAGE_KEY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid client configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("base URL must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
}

/// Client configuration for the browser front end
///
/// Every field has a default, so a hosting page only needs to pass the values
/// it wants to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub storage_key: String,
    pub theme_storage_key: String,
    pub export_filename: String,
    /// Render assistant replies as markdown
    pub markdown: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storage_key: HISTORY_STORAGE_KEY.to_string(),
            theme_storage_key: THEME_STORAGE_KEY.to_string(),
            export_filename: EXPORT_FILENAME.to_string(),
            markdown: true,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON override object and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.starts_with("http://") || self.base_url.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidBaseUrl(self.base_url.clone()))
        }
    }

    /// Full URL of a backend endpoint, e.g. `endpoint("chat")`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint("chat"), "http://localhost:8000/chat");
        assert_eq!(config.storage_key, "neurobot_conversations");
        assert_eq!(config.export_filename, "neurobot_conversation.pdf");
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = ClientConfig::from_json(r#"{"base_url":"https://bot.example.com/api/"}"#).unwrap();
        assert_eq!(config.endpoint("/export-pdf"), "https://bot.example.com/api/export-pdf");
        assert_eq!(config.storage_key, HISTORY_STORAGE_KEY);
        assert!(config.markdown);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = ClientConfig::from_json(r#"{"base_url":"ftp://example.com"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

        let err = ClientConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
