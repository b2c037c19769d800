//! OpenAI-compatible chat completion adapter.
//!
//! Serves every backend speaking the `/chat/completions` wire format:
//! OpenAI itself, plus Groq, DeepSeek and xAI under their own provider keys.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{Error, ProviderError};
use crate::provider::ChatProvider;
use crate::types::{
    Choice, CompletionOptions, CompletionResponse, Message, Role, Usage,
};

/// Adapter for OpenAI-compatible backends.
pub struct OpenAiCompatibleProvider {
    name: String,
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Construct from a [`ProviderConfig`], resolving the credential from the
    /// explicit config or `env_var` and the endpoint from the config or
    /// `default_base_url`.
    pub fn from_config(
        name: &str,
        env_var: &str,
        default_base_url: &str,
        config: &ProviderConfig,
    ) -> Result<Self, Error> {
        let api_key = config
            .resolve_api_key(env_var)
            .ok_or_else(|| Error::Configuration {
                provider: name.to_string(),
                message: format!("missing api key (set `api_key` or the {env_var} environment variable)"),
            })?;

        Ok(Self {
            name: name.to_string(),
            client: config.http_client(name)?,
            base_url: config.resolve_base_url(default_base_url),
            api_key,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let wire_request = WireRequest {
            model,
            messages,
            options,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&wire_request)
            .send()
            .await?;

        debug!(provider = self.name, status = %response.status(), "completion response");

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(provider = self.name, status, "backend returned error");
            return Err(ProviderError::Api { status, message });
        }

        let wire_response: WireResponse = response.json().await?;
        normalize(wire_response)
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(flatten)]
    options: &'a CompletionOptions,
}

#[derive(Deserialize)]
struct WireResponse {
    id: Option<String>,
    #[serde(default)]
    choices: Vec<WireChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct WireChoice {
    index: Option<u32>,
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
}

fn normalize(response: WireResponse) -> Result<CompletionResponse, ProviderError> {
    if response.choices.is_empty() {
        return Err(ProviderError::UnexpectedResponse(
            "completion reply contained no choices".to_string(),
        ));
    }

    let choices = response
        .choices
        .into_iter()
        .enumerate()
        .map(|(i, choice)| Choice {
            index: choice.index.unwrap_or(i as u32),
            message: Message {
                role: Role::Assistant,
                content: choice.message.content.unwrap_or_default(),
            },
            finish_reason: choice.finish_reason,
        })
        .collect();

    Ok(CompletionResponse {
        id: response.id,
        choices,
        usage: response.usage,
    })
}
