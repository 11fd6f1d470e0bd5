//! Issuer connection configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Error loading or parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

/// Connection settings for the ticket issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Endpoint that issues fresh tickets.
    pub endpoint: Url,

    /// Access token presented to the issuer. Obtaining and rotating this
    /// token is outside this crate's scope.
    pub access_token: Secret,

    /// Per-fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl IssuerConfig {
    /// Create a configuration with the default fetch timeout.
    pub fn new(endpoint: Url, access_token: Secret) -> Self {
        Self {
            endpoint,
            access_token,
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }

    /// Parse a configuration from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacted() {
        let secret = Secret::new("super-secret");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_secret_display_redacted() {
        let secret = Secret::new("super-secret");
        let display = format!("{}", secret);
        assert!(!display.contains("super-secret"));
        assert!(display.contains("REDACTED"));
    }

    #[test]
    fn test_config_from_toml() {
        let config = IssuerConfig::from_toml_str(
            r#"
            endpoint = "https://issuer.example.com/ticket"
            access_token = "tok-123"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.as_str(), "https://issuer.example.com/ticket");
        assert_eq!(config.access_token.expose(), "tok-123");
        assert_eq!(config.fetch_timeout_secs, 30);
    }

    #[test]
    fn test_config_explicit_timeout() {
        let config = IssuerConfig::from_toml_str(
            r#"
            endpoint = "https://issuer.example.com/ticket"
            access_token = "tok-123"
            fetch_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.fetch_timeout_secs, 5);
    }

    #[test]
    fn test_config_rejects_invalid_toml() {
        let result = IssuerConfig::from_toml_str("endpoint = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
