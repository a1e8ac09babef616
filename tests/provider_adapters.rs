//! Wire-format tests for the provider adapters against a mock HTTP backend

use serde_json::json;
use taskroute::providers::{
    CallOptions, GoogleProvider, OpenAiProvider, ProviderAdapter, ProviderError, ProviderKind,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-42",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 11, "completion_tokens": 5, "total_tokens": 16 }
    })
}

#[tokio::test]
async fn test_openai_sends_bearer_auth_and_chat_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-5",
            "messages": [{ "role": "user", "content": "Reverse this string" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_completion("gnirts")))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        OpenAiProvider::new(format!("{}/v1", server.uri()), Some("sk-test".to_string()), 5)
            .unwrap();
    let result = provider
        .call_model("gpt-5", "Reverse this string", None)
        .await
        .expect("call should succeed");

    assert_eq!(provider.kind(), ProviderKind::OpenAi);
    assert_eq!(result.text, "gnirts");
    assert_eq!(result.tokens_in, 11);
    assert_eq!(result.tokens_out, 5);
    assert_eq!(result.raw_response["id"], "chatcmpl-42");
}

#[tokio::test]
async fn test_openai_forwards_system_prompt_and_extra_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("x-title", "LLM Router"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "Answer tersely." },
                { "role": "user", "content": "hi" }
            ],
            "temperature": 0.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_completion("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(server.uri(), None, 5)
        .unwrap()
        .with_header("X-Title", "LLM Router");
    let opts = CallOptions {
        system_prompt: Some("Answer tersely.".to_string()),
        temperature: Some(0.0),
        max_tokens: None,
    };

    let result = provider.call_model("gpt-5-mini", "hi", Some(&opts)).await;
    assert_eq!(result.unwrap().text, "hello");
}

#[tokio::test]
async fn test_openai_error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"error":{"message":"rate limited"}}"#),
        )
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(server.uri(), Some("sk".to_string()), 5).unwrap();
    let err = provider.call_model("gpt-5", "hi", None).await.unwrap_err();

    assert_eq!(err.status(), Some(429));
    assert_eq!(err.provider(), ProviderKind::OpenAi);
    assert_eq!(err.model(), "gpt-5");
    assert!(err.body().unwrap().contains("rate limited"));
}

#[tokio::test]
async fn test_openai_non_json_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(server.uri(), None, 5).unwrap();
    let err = provider.call_model("gpt-5", "hi", None).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_openai_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_completion("late"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(server.uri(), None, 1).unwrap();
    let err = provider.call_model("gpt-5", "hi", None).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::Timeout { timeout_seconds: 1, .. }),
        "expected timeout, got {err}"
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Port 9 (discard) is not listening in test environments
    let provider = OpenAiProvider::new("http://127.0.0.1:9", None, 5).unwrap();
    let err = provider.call_model("gpt-5", "hi", None).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport { .. }));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_google_generate_content_wire_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "g-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Summarize: rust is fast" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Rust " }, { "text": "is fast." }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        GoogleProvider::new(format!("{}/v1beta", server.uri()), Some("g-key".to_string()), 5)
            .unwrap();
    let result = provider
        .call_model("gemini-2.5-flash", "Summarize: rust is fast", None)
        .await
        .unwrap();

    assert_eq!(provider.kind(), ProviderKind::Google);
    assert_eq!(result.text, "Rust is fast.");
    assert_eq!(result.tokens_in, 7);
    assert_eq!(result.tokens_out, 3);
}

#[tokio::test]
async fn test_google_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let provider = GoogleProvider::new(server.uri(), Some("bad".to_string()), 5).unwrap();
    let err = provider
        .call_model("gemini-2.5-pro", "hi", None)
        .await
        .unwrap_err();

    assert_eq!(err.provider(), ProviderKind::Google);
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.body(), Some("API key not valid"));
}
