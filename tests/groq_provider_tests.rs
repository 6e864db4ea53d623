//! Groq provider against a mock Chat Completions endpoint.

use agent_team::error::AgentError;
use agent_team::models::GroqModel;
use agent_team::provider::groq::GroqProvider;
use agent_team::provider::{ModelProvider, ProviderRequest};
use agent_team::types::*;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> GroqProvider {
    GroqProvider::new(
        GroqModel::Llama3370bVersatile,
        "test-key".into(),
        Some(server.uri()),
    )
}

fn request() -> ProviderRequest {
    ProviderRequest {
        messages: vec![
            ModelMessage::system("You are helpful."),
            ModelMessage::user("NVDA price?"),
        ],
        settings: GenerationSettings {
            max_tokens: Some(1024),
            temperature: Some(0.7),
            ..Default::default()
        },
        tools: None,
    }
}

#[tokio::test]
async fn generate_text_posts_model_settings_and_reads_tool_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "stream": false,
            "max_tokens": 1024,
            "temperature": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "get_current_stock_price",
                            "arguments": "{\"symbol\":\"NVDA\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server).generate_text(&request()).await.unwrap();

    assert_eq!(response.text, "");
    assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(response.usage.total_tokens, 20);
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].name, "get_current_stock_price");
    assert_eq!(response.tool_calls[0].arguments, json!({"symbol": "NVDA"}));
}

#[tokio::test]
async fn stream_text_yields_deltas_then_done_with_usage() {
    let server = MockServer::start().await;
    let sse = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"NVDA is \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"up today.\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}],",
        "\"x_groq\":{\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":4,\"total_tokens\":9}}}\n\n",
        "data: [DONE]\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .mount(&server)
        .await;

    let deltas: Vec<TextStreamDelta> = provider(&server)
        .stream_text(&request())
        .await
        .unwrap()
        .map(|d| d.unwrap())
        .collect()
        .await;

    let text: String = deltas.iter().map(|d| d.text.as_str()).collect();
    assert_eq!(text, "NVDA is up today.");
    let done = deltas.last().unwrap();
    assert_eq!(done.event_type, StreamEventType::Done);
    assert_eq!(done.finish_reason, Some(FinishReason::Stop));
    assert_eq!(done.usage.as_ref().map(|u| u.total_tokens), Some(9));
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = provider(&server).generate_text(&request()).await.err().unwrap();

    match err {
        AgentError::Authentication(message) => assert_eq!(message, "Invalid API Key"),
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_maps_to_retryable_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "retry_after": 1.5}
        })))
        .mount(&server)
        .await;

    let err = provider(&server).stream_text(&request()).await.err().unwrap();

    assert!(err.is_retryable());
    assert!(matches!(
        err,
        AgentError::RateLimited {
            retry_after_ms: Some(1500)
        }
    ));
}

#[tokio::test]
async fn retired_model_maps_to_model_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "message": "The model `llama-3.3-70b-versatile` does not exist",
                "code": "model_not_found"
            }
        })))
        .mount(&server)
        .await;

    let err = provider(&server).generate_text(&request()).await.err().unwrap();

    assert!(matches!(err, AgentError::ModelNotFound(_)));
    assert!(!err.is_retryable());
}
