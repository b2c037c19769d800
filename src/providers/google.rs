//! Google Gemini chat completion adapter.
//!
//! The backend has a restricted role vocabulary: the system prompt travels
//! in `systemInstruction` and assistant turns use the role `model`.

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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Adapter for the Gemini `generateContent` API.
pub struct GoogleProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, Error> {
        let api_key = config
            .resolve_api_key("GEMINI_API_KEY")
            .ok_or_else(|| Error::Configuration {
                provider: "google".to_string(),
                message: "missing api key (set `api_key` or the GEMINI_API_KEY environment variable)"
                    .to_string(),
            })?;

        Ok(Self {
            client: config.http_client("google")?,
            base_url: config.resolve_base_url(DEFAULT_BASE_URL),
            api_key,
        })
    }
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let wire_request = to_request(messages, options);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&wire_request)
            .send()
            .await?;

        debug!(provider = "google", status = %response.status(), "completion response");

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(provider = "google", status, "backend returned error");
            return Err(ProviderError::Api { status, message });
        }

        let wire_response: WireResponse = response.json().await?;
        from_response(wire_response)
    }
}

// --- Wire types and conversions ---

#[derive(Serialize)]
struct WireRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize)]
struct WirePart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireCandidate {
    content: Option<WireContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u32,
}

fn to_request(messages: &[Message], options: &CompletionOptions) -> WireRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for msg in messages {
        let role = match msg.role {
            Role::System => {
                system_parts.push(WirePart {
                    text: msg.content.clone(),
                });
                continue;
            }
            Role::Assistant => "model",
            Role::User | Role::Tool => "user",
        };
        contents.push(WireContent {
            role: Some(role.to_string()),
            parts: vec![WirePart {
                text: msg.content.clone(),
            }],
        });
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(WireContent {
            role: None,
            parts: system_parts,
        })
    };

    let generation_config =
        if options.temperature.is_some() || options.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
            })
        } else {
            None
        };

    WireRequest {
        system_instruction,
        contents,
        generation_config,
    }
}

fn from_response(response: WireResponse) -> Result<CompletionResponse, ProviderError> {
    // A reply without candidates has nothing to normalize; surface it
    // instead of indexing past the end.
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ProviderError::UnexpectedResponse(
            "reply contained no candidates".to_string(),
        ));
    };

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: None,
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: Role::Assistant,
                content,
            },
            finish_reason: candidate.finish_reason,
        }],
        usage: response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }),
    })
}
