//! Anthropic chat completion adapter with native API format.

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

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Substituted when the caller did not set `max_tokens`; the Anthropic API
/// requires the field.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Adapter for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, Error> {
        let api_key = config
            .resolve_api_key("ANTHROPIC_API_KEY")
            .ok_or_else(|| Error::Configuration {
                provider: "anthropic".to_string(),
                message: "missing api key (set `api_key` or the ANTHROPIC_API_KEY environment variable)"
                    .to_string(),
            })?;

        Ok(Self {
            client: config.http_client("anthropic")?,
            base_url: config.resolve_base_url(DEFAULT_BASE_URL),
            api_key,
        })
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let wire_request = to_request(model, messages, options);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&wire_request)
            .send()
            .await?;

        debug!(provider = "anthropic", status = %response.status(), "completion response");

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(provider = "anthropic", status, "backend returned error");
            return Err(ProviderError::Api { status, message });
        }

        let wire_response: WireResponse = response.json().await?;
        Ok(from_response(wire_response))
    }
}

// --- Wire types and conversions ---

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct WireResponse {
    id: Option<String>,
    #[serde(default)]
    content: Vec<WireContent>,
    stop_reason: Option<String>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// The API takes the system prompt as a separate field and allows only
/// user/assistant roles in the conversation, so system messages are lifted
/// out and tool messages travel as user content.
fn to_request<'a>(
    model: &'a str,
    messages: &[Message],
    options: &CompletionOptions,
) -> WireRequest<'a> {
    let mut system_parts = Vec::new();
    let mut wire_messages = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(msg.content.clone()),
            Role::User | Role::Tool => wire_messages.push(WireMessage {
                role: "user",
                content: msg.content.clone(),
            }),
            Role::Assistant => wire_messages.push(WireMessage {
                role: "assistant",
                content: msg.content.clone(),
            }),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    WireRequest {
        model,
        max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        system,
        messages: wire_messages,
        temperature: options.temperature,
    }
}

fn from_response(response: WireResponse) -> CompletionResponse {
    let content = response
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text)
        .collect::<Vec<_>>()
        .join("");

    CompletionResponse {
        id: response.id,
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: Role::Assistant,
                content,
            },
            finish_reason: response.stop_reason,
        }],
        usage: response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        }),
    }
}
