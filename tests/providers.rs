//! HTTP adapter behavior against a mock backend.

use std::collections::HashMap;

use llmux::providers::{
    AnthropicProvider, CohereProvider, GoogleProvider, OpenAiCompatibleProvider,
};
use llmux::{
    ChatProvider, Client, CompletionOptions, Message, ProviderConfig, ProviderError, Role,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn request_body(mock_server: &MockServer) -> serde_json::Value {
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    serde_json::from_slice(&requests[0].body).unwrap()
}

// ============================================================================
// OpenAI-compatible
// ============================================================================

#[tokio::test]
async fn test_openai_completion_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hello there" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12 }
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiCompatibleProvider::new("openai", "test-key", mock_server.uri());
    let response = provider
        .complete(
            "gpt-4o-mini",
            &[Message::user("hi")],
            &CompletionOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.content(), "Hello there");
    assert_eq!(response.choices[0].message.role, Role::Assistant);
    assert_eq!(response.usage.unwrap().total_tokens, 12);
}

#[tokio::test]
async fn test_openai_error_status_becomes_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let provider = OpenAiCompatibleProvider::new("openai", "bad-key", mock_server.uri());
    let result = provider
        .complete(
            "gpt-4o-mini",
            &[Message::user("hi")],
            &CompletionOptions::default(),
        )
        .await;

    match result {
        Err(ProviderError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid api key");
        }
        Err(other) => panic!("expected Api error, got {other}"),
        Ok(_) => panic!("expected Api error, got a response"),
    }
}

#[tokio::test]
async fn test_openai_reply_without_choices_is_unexpected_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "choices": []
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiCompatibleProvider::new("openai", "test-key", mock_server.uri());
    let result = provider
        .complete(
            "gpt-4o-mini",
            &[Message::user("hi")],
            &CompletionOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(ProviderError::UnexpectedResponse(_))));
}

#[tokio::test]
async fn test_openai_options_and_extra_keys_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "ok" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAiCompatibleProvider::new("openai", "test-key", mock_server.uri());
    let mut options = CompletionOptions {
        temperature: Some(0.2),
        max_tokens: Some(64),
        ..Default::default()
    };
    options.extra.insert("top_p".to_string(), json!(0.9));

    provider
        .complete("gpt-4o-mini", &[Message::user("hi")], &options)
        .await
        .unwrap();

    let body = request_body(&mock_server).await;
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["temperature"], 0.2);
    assert_eq!(body["max_tokens"], 64);
    assert_eq!(body["top_p"], 0.9);
}

// ============================================================================
// Anthropic
// ============================================================================

#[tokio::test]
async fn test_anthropic_lifts_system_message_out_of_conversation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "content": [{ "type": "text", "text": "understood" }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 5, "output_tokens": 2 }
        })))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("ak-test", mock_server.uri());
    let response = provider
        .complete(
            "claude-sonnet-4-0",
            &[Message::system("s"), Message::user("u")],
            &CompletionOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.content(), "understood");
    assert_eq!(response.usage.unwrap().total_tokens, 7);

    let body = request_body(&mock_server).await;
    assert_eq!(body["system"], "s");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "u");
}

#[tokio::test]
async fn test_anthropic_error_status_becomes_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&mock_server)
        .await;

    let provider = AnthropicProvider::new("ak-test", mock_server.uri());
    let result = provider
        .complete(
            "claude-sonnet-4-0",
            &[Message::user("hi")],
            &CompletionOptions::default(),
        )
        .await;

    assert!(matches!(
        result,
        Err(ProviderError::Api { status: 429, .. })
    ));
}

// ============================================================================
// Google
// ============================================================================

#[tokio::test]
async fn test_google_remaps_roles_and_normalizes_candidates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "g-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "four" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 8,
                "candidatesTokenCount": 1,
                "totalTokenCount": 9
            }
        })))
        .mount(&mock_server)
        .await;

    let provider = GoogleProvider::new("g-test", mock_server.uri());
    let response = provider
        .complete(
            "gemini-2.0-flash",
            &[
                Message::system("be terse"),
                Message::user("2+2?"),
                Message::assistant("working on it"),
                Message::user("well?"),
            ],
            &CompletionOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.content(), "four");
    assert_eq!(response.usage.unwrap().total_tokens, 9);

    let body = request_body(&mock_server).await;
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["role"], "user");
}

#[tokio::test]
async fn test_google_reply_without_candidates_is_unexpected_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let provider = GoogleProvider::new("g-test", mock_server.uri());
    let result = provider
        .complete(
            "gemini-2.0-flash",
            &[Message::user("hi")],
            &CompletionOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(ProviderError::UnexpectedResponse(_))));
}

// ============================================================================
// Cohere
// ============================================================================

#[tokio::test]
async fn test_cohere_splits_history_and_normalizes_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("Authorization", "Bearer co-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "All set.",
            "generation_id": "gen-1",
            "finish_reason": "COMPLETE"
        })))
        .mount(&mock_server)
        .await;

    let provider = CohereProvider::new("co-test", mock_server.uri());
    let response = provider
        .complete(
            "command-r",
            &[
                Message::user("Hi"),
                Message::assistant("Hello!"),
                Message::user("Wrap up."),
            ],
            &CompletionOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.content(), "All set.");
    assert_eq!(response.id.as_deref(), Some("gen-1"));

    let body = request_body(&mock_server).await;
    assert_eq!(body["message"], "Wrap up.");
    let history = body["chat_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "USER");
    assert_eq!(history[1]["role"], "CHATBOT");
}

// ============================================================================
// End to end through the Client
// ============================================================================

#[tokio::test]
async fn test_client_dispatches_builtin_provider_with_endpoint_override() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "routed" },
                "finish_reason": "stop"
            }]
        })))
        .mount(&mock_server)
        .await;

    let client = Client::new(HashMap::from([(
        "groq".to_string(),
        ProviderConfig {
            api_key: Some("gsk-test".to_string()),
            base_url: Some(mock_server.uri()),
            ..Default::default()
        },
    )]));

    let response = client
        .complete(
            "groq:llama-3.3-70b-versatile",
            vec![Message::user("hi")],
            CompletionOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.content(), "routed");
}
