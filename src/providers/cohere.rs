//! Cohere chat completion adapter.
//!
//! The chat API takes the newest message separately from the preceding
//! history and answers with a single `text` field rather than choices.

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

const DEFAULT_BASE_URL: &str = "https://api.cohere.com";

/// Adapter for the Cohere chat API.
pub struct CohereProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CohereProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, Error> {
        let api_key = config
            .resolve_api_key("CO_API_KEY")
            .ok_or_else(|| Error::Configuration {
                provider: "cohere".to_string(),
                message: "missing api key (set `api_key` or the CO_API_KEY environment variable)"
                    .to_string(),
            })?;

        Ok(Self {
            client: config.http_client("cohere")?,
            base_url: config.resolve_base_url(DEFAULT_BASE_URL),
            api_key,
        })
    }
}

#[async_trait]
impl ChatProvider for CohereProvider {
    fn name(&self) -> &str {
        "cohere"
    }

    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/v1/chat", self.base_url);
        let wire_request = to_request(model, messages, options);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&wire_request)
            .send()
            .await?;

        debug!(provider = "cohere", status = %response.status(), "completion response");

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(provider = "cohere", status, "backend returned error");
            return Err(ProviderError::Api { status, message });
        }

        let wire_response: WireResponse = response.json().await?;
        from_response(wire_response)
    }
}

// --- Wire types and conversions ---

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    chat_history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct HistoryEntry {
    role: &'static str,
    message: String,
}

#[derive(Deserialize)]
struct WireResponse {
    text: Option<String>,
    generation_id: Option<String>,
    finish_reason: Option<String>,
    meta: Option<WireMeta>,
}

#[derive(Deserialize)]
struct WireMeta {
    tokens: Option<WireTokens>,
}

#[derive(Deserialize)]
struct WireTokens {
    #[serde(default)]
    input_tokens: f64,
    #[serde(default)]
    output_tokens: f64,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "SYSTEM",
        Role::User => "USER",
        Role::Assistant => "CHATBOT",
        Role::Tool => "TOOL",
    }
}

/// Callers guarantee `messages` is non-empty; the final message becomes the
/// prompt and everything before it becomes history.
fn to_request<'a>(
    model: &'a str,
    messages: &[Message],
    options: &CompletionOptions,
) -> WireRequest<'a> {
    let (last, history) = match messages.split_last() {
        Some((last, rest)) => (last.content.clone(), rest),
        None => (String::new(), messages),
    };

    let chat_history = history
        .iter()
        .map(|msg| HistoryEntry {
            role: role_name(msg.role),
            message: msg.content.clone(),
        })
        .collect();

    WireRequest {
        model,
        message: last,
        chat_history,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    }
}

fn from_response(response: WireResponse) -> Result<CompletionResponse, ProviderError> {
    let Some(text) = response.text else {
        return Err(ProviderError::UnexpectedResponse(
            "reply contained no text field".to_string(),
        ));
    };

    Ok(CompletionResponse {
        id: response.generation_id,
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: Role::Assistant,
                content: text,
            },
            finish_reason: response.finish_reason,
        }],
        usage: response.meta.and_then(|m| m.tokens).map(|t| Usage {
            prompt_tokens: t.input_tokens as u32,
            completion_tokens: t.output_tokens as u32,
            total_tokens: (t.input_tokens + t.output_tokens) as u32,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_message_split_from_history() {
        let messages = vec![
            Message::system("Be helpful."),
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("What now?"),
        ];
        let request = to_request("command-r", &messages, &CompletionOptions::default());

        assert_eq!(request.message, "What now?");
        assert_eq!(request.chat_history.len(), 3);
        assert_eq!(request.chat_history[0].role, "SYSTEM");
        assert_eq!(request.chat_history[1].role, "USER");
        assert_eq!(request.chat_history[2].role, "CHATBOT");
    }

    #[test]
    fn test_single_message_has_no_history() {
        let messages = vec![Message::user("Hi")];
        let request = to_request("command-r", &messages, &CompletionOptions::default());

        assert_eq!(request.message, "Hi");
        assert!(request.chat_history.is_empty());
    }

    #[test]
    fn test_missing_text_is_provider_error() {
        let response = WireResponse {
            text: None,
            generation_id: None,
            finish_reason: None,
            meta: None,
        };

        let result = from_response(response);
        assert!(matches!(result, Err(ProviderError::UnexpectedResponse(_))));
    }

    #[test]
    fn test_response_normalization() {
        let response = WireResponse {
            text: Some("All good.".to_string()),
            generation_id: Some("gen-1".to_string()),
            finish_reason: Some("COMPLETE".to_string()),
            meta: Some(WireMeta {
                tokens: Some(WireTokens {
                    input_tokens: 12.0,
                    output_tokens: 3.0,
                }),
            }),
        };

        let normalized = from_response(response).unwrap();
        assert_eq!(normalized.content(), "All good.");
        assert_eq!(normalized.id.as_deref(), Some("gen-1"));
        assert_eq!(normalized.usage.unwrap().total_tokens, 15);
    }
}
