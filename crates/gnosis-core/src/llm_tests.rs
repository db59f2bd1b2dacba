//! LLM module tests

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::LlmConfig;
use crate::error::Error;
use crate::llm::{GenerativeModel, LlmClient, Message, ResponseFormat};

fn client_for(server: &MockServer) -> LlmClient {
    let config = LlmConfig {
        base_url: format!("{}/v1", server.uri()),
        model: "llama-4-scout-17b-16e-instruct".to_string(),
        ..LlmConfig::default()
    };
    LlmClient::new(config, "test-api-key").unwrap()
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1,
        "model": "llama-4-scout-17b-16e-instruct",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42}
    })
}

#[tokio::test]
async fn test_complete_sends_model_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({
            "model": "llama-4-scout-17b-16e-instruct",
            "messages": [{"role": "user", "content": "Expand Philosophy"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .complete(vec![Message::user("Expand Philosophy")], None)
        .await
        .unwrap();

    assert_eq!(response.content, "hello");
    assert_eq!(response.tokens_used, 42);
}

#[tokio::test]
async fn test_generate_forwards_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": {"type": "json_schema", "json_schema": {"name": "expansion"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let format = ResponseFormat::json_schema("expansion", json!({"type": "object"}));
    let response = client
        .generate(vec![Message::user("hi")], Some(format))
        .await
        .unwrap();

    assert_eq!(response.content, "{}");
    assert_eq!(client.model_name(), "llama-4-scout-17b-16e-instruct");
}

#[tokio::test]
async fn test_unauthorized_maps_to_inference_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(vec![Message::user("hi")], None)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INFERENCE_FAILED");
    assert!(err.to_string().contains("CEREBRAS_API_KEY"));
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(vec![Message::user("hi")], None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Inference { .. }));
    assert!(err.to_string().contains("Rate limited"));
}

#[tokio::test]
async fn test_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "m",
            "choices": []
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(vec![Message::user("hi")], None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Empty response"));
}

#[tokio::test]
async fn test_malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .complete(vec![Message::user("hi")], None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to parse response"));
}
