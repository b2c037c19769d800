//! Provider configuration: the per-provider settings bag and a YAML file
//! loader for binding many of them at once.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::error::Error;

// ============================================================================
// ProviderConfig
// ============================================================================

/// Settings for one provider: credentials, endpoint override, timeout, and
/// arbitrary provider-specific keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProviderConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Resolve the credential for this provider: an explicit `api_key`
    /// overrides the named environment variable, which is consulted only
    /// here, at adapter construction time.
    pub fn resolve_api_key(&self, env_var: &str) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(env_var).ok())
    }

    /// Resolve the endpoint, falling back to the provider's default.
    pub fn resolve_base_url(&self, default: &str) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| default.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Build the HTTP client an adapter uses for its lifetime, applying the
    /// configured timeout.
    pub(crate) fn http_client(&self, provider: &str) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build().map_err(|e| Error::Configuration {
            provider: provider.to_string(),
            message: format!("failed to build http client: {e}"),
        })
    }
}

// ============================================================================
// Config file
// ============================================================================

/// On-disk configuration: a mapping from provider key to [`ProviderConfig`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load configuration from a YAML file. A missing file yields the empty
    /// default; anything else unreadable or unparsable is an error.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

// ============================================================================
// Tests
// ============================================================================
