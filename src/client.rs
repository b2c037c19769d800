//! The client: per-provider configuration, lazy adapter cache, address
//! parsing, and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::provider::ChatProvider;
use crate::registry::Registry;
use crate::types::{CompletionOptions, CompletionResponse, Message};

/// A client multiplexing chat completions across providers.
///
/// Adapters are instantiated lazily on first use of a provider key and
/// cached for the client's lifetime; [`Client::configure`] evicts the cached
/// adapter for every key it updates so the next use picks up fresh settings.
pub struct Client {
    registry: Registry,
    configs: DashMap<String, ProviderConfig>,
    providers: DashMap<String, Arc<dyn ChatProvider>>,
}

impl Client {
    /// Construct with the built-in provider set and zero or more provider
    /// configs.
    pub fn new(configs: HashMap<String, ProviderConfig>) -> Self {
        Self::with_registry(Registry::builtin(), configs)
    }

    /// Construct against a caller-supplied registry.
    pub fn with_registry(registry: Registry, configs: HashMap<String, ProviderConfig>) -> Self {
        Self {
            registry,
            configs: configs.into_iter().collect(),
            providers: DashMap::new(),
        }
    }

    /// Every provider key this client can dispatch to.
    pub fn supported_providers(&self) -> &[String] {
        self.registry.supported_providers()
    }

    /// Merge `updates` into the provider configuration, key by key with last
    /// write winning, and evict the cached adapter for each updated key.
    pub fn configure(&self, updates: HashMap<String, ProviderConfig>) {
        for (key, config) in updates {
            debug!(provider = %key, "provider reconfigured");
            self.configs.insert(key.clone(), config);
            // Evict after the config lands so a racing first-use that cached
            // an adapter built from stale settings is still thrown out.
            self.providers.remove(&key);
        }
    }

    /// Route one chat completion to the provider named by `address`.
    ///
    /// `address` has the form `provider:model`; everything after the first
    /// `:` belongs to the model name.
    pub async fn complete(
        &self,
        address: &str,
        messages: Vec<Message>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, Error> {
        let (provider_key, model) = parse_address(address)?;

        if !self.registry.is_supported(provider_key) {
            return Err(Error::UnsupportedProvider {
                key: provider_key.to_string(),
                supported: self.registry.supported_providers().to_vec(),
            });
        }

        if messages.is_empty() {
            return Err(Error::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }

        let provider = self.provider_for(provider_key)?;

        info!(provider = provider_key, model, "dispatching chat completion");
        provider
            .complete(model, &messages, &options)
            .await
            .map_err(Error::from)
    }

    /// Get the cached adapter for `key`, constructing it on first use.
    ///
    /// The map entry holds its shard lock for the duration of construction,
    /// so concurrent first-use for one key serializes and at most one
    /// adapter instance per key is ever retained. A failed construction
    /// inserts nothing, letting a later call retry with corrected config.
    fn provider_for(&self, key: &str) -> Result<Arc<dyn ChatProvider>, Error> {
        match self.providers.entry(key.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let config = self
                    .configs
                    .get(key)
                    .map(|c| c.value().clone())
                    .unwrap_or_default();
                let provider = self.registry.create(key, &config)?;
                entry.insert(provider.clone());
                Ok(provider)
            }
        }
    }
}

/// Split `provider:model` on the first `:`; both sides must be non-empty.
fn parse_address(address: &str) -> Result<(&str, &str), Error> {
    match address.split_once(':') {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
            Ok((provider, model))
        }
        _ => Err(Error::MalformedAddress {
            address: address.to_string(),
        }),
    }
}
