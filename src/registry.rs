//! Provider registry: an explicit registration table from provider key to
//! adapter constructor, fixed at build time and extensible through
//! [`Registry::register`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::provider::ChatProvider;
use crate::providers::{
    AnthropicProvider, CohereProvider, GoogleProvider, OpenAiCompatibleProvider,
};

type Constructor =
    Arc<dyn Fn(&ProviderConfig) -> Result<Arc<dyn ChatProvider>, Error> + Send + Sync>;

/// Registry of adapter constructors, keyed by provider key.
#[derive(Clone, Default)]
pub struct Registry {
    table: HashMap<String, Constructor>,
    supported: Vec<String>,
}

impl Registry {
    /// An empty registry with no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in provider.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        for (key, env_var, base_url) in [
            ("openai", "OPENAI_API_KEY", "https://api.openai.com/v1"),
            ("groq", "GROQ_API_KEY", "https://api.groq.com/openai/v1"),
            ("deepseek", "DEEPSEEK_API_KEY", "https://api.deepseek.com/v1"),
            ("xai", "XAI_API_KEY", "https://api.x.ai/v1"),
        ] {
            registry.register(key, move |config| {
                let provider: Arc<dyn ChatProvider> = Arc::new(
                    OpenAiCompatibleProvider::from_config(key, env_var, base_url, config)?,
                );
                Ok(provider)
            });
        }

        registry.register("anthropic", |config| {
            let provider: Arc<dyn ChatProvider> =
                Arc::new(AnthropicProvider::from_config(config)?);
            Ok(provider)
        });

        registry.register("cohere", |config| {
            let provider: Arc<dyn ChatProvider> = Arc::new(CohereProvider::from_config(config)?);
            Ok(provider)
        });

        registry.register("google", |config| {
            let provider: Arc<dyn ChatProvider> = Arc::new(GoogleProvider::from_config(config)?);
            Ok(provider)
        });

        registry
    }

    /// Register a constructor for `key`, replacing any existing entry.
    pub fn register<F>(&mut self, key: impl Into<String>, constructor: F)
    where
        F: Fn(&ProviderConfig) -> Result<Arc<dyn ChatProvider>, Error> + Send + Sync + 'static,
    {
        self.table.insert(key.into(), Arc::new(constructor));
        self.supported = self.table.keys().cloned().collect();
        self.supported.sort();
    }

    /// Every provider key with a registered adapter, sorted. Computed when
    /// the table changes, stable otherwise.
    pub fn supported_providers(&self) -> &[String] {
        &self.supported
    }

    pub fn is_supported(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Instantiate the adapter for `key`, passing `config` through verbatim.
    pub fn create(
        &self,
        key: &str,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn ChatProvider>, Error> {
        let constructor = self
            .table
            .get(key)
            .ok_or_else(|| Error::UnsupportedProvider {
                key: key.to_string(),
                supported: self.supported.clone(),
            })?;
        constructor(config)
    }
}
