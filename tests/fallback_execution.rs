//! Executor fallback behavior against mock provider backends

use serde_json::json;
use std::sync::Arc;
use taskroute::{
    executor::Executor,
    metrics::Metrics,
    models::ModelCandidate,
    providers::{GoogleProvider, OpenAiProvider, ProviderKind, ProviderRegistry},
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn executor() -> (Executor, Arc<Metrics>, MockServer, MockServer) {
    let openai = MockServer::start().await;
    let google = MockServer::start().await;
    let providers = ProviderRegistry::new()
        .with(Arc::new(OpenAiProvider::new(openai.uri(), None, 5).unwrap()))
        .with(Arc::new(GoogleProvider::new(google.uri(), None, 5).unwrap()));
    let metrics = Arc::new(Metrics::new().unwrap());
    (
        Executor::new(Arc::new(providers), metrics.clone()),
        metrics,
        openai,
        google,
    )
}

#[tokio::test]
async fn test_cross_provider_fallback() {
    let (executor, metrics, openai, google) = executor().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "rescued" }] } }]
        })))
        .expect(1)
        .mount(&google)
        .await;

    let candidate = ModelCandidate::new("gpt-5-mini", ProviderKind::OpenAi, 8.0, 0.003, 600)
        .with_fallback("gemini-2.5-flash", ProviderKind::Google);
    let execution = executor
        .execute(&candidate, "hello", "req-fallback")
        .await
        .expect("fallback should succeed");

    assert!(execution.fallback_used);
    assert_eq!(execution.model, "gemini-2.5-flash");
    assert_eq!(execution.provider, ProviderKind::Google);
    assert_eq!(execution.result.text, "rescued");
    assert_eq!(metrics.fallbacks_count(), 1);
}

#[tokio::test]
async fn test_fallback_is_tried_at_most_once() {
    let (executor, _metrics, openai, _google) = executor().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&openai)
        .await;

    let candidate = ModelCandidate::new("gpt-5", ProviderKind::OpenAi, 9.0, 0.015, 1200)
        .with_fallback("gpt-5-mini", ProviderKind::OpenAi);
    let err = executor
        .execute(&candidate, "hello", "req-double")
        .await
        .unwrap_err();

    assert_eq!(err.candidate(), "gpt-5");
    assert_eq!(err.fallback(), Some("gpt-5-mini"));
    assert_eq!(err.provider_error().status(), Some(500));
    assert_eq!(err.provider_error().model(), "gpt-5");
    assert_eq!(err.fallback_error().and_then(|e| e.status()), Some(500));
    assert_eq!(err.fallback_error().map(|e| e.model()), Some("gpt-5-mini"));
}

#[tokio::test]
async fn test_success_records_attempt_and_latency() {
    let (executor, metrics, openai, _google) = executor().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "hi" } }]
        })))
        .mount(&openai)
        .await;

    let candidate = ModelCandidate::new("gpt-5-nano", ProviderKind::OpenAi, 6.0, 0.001, 300);
    let execution = executor.execute(&candidate, "hello", "req-ok").await.unwrap();
    assert!(!execution.fallback_used);

    let scrape = metrics.gather().unwrap();
    assert!(scrape.contains(
        "taskroute_provider_attempts_total{outcome=\"success\",provider=\"openai\"} 1"
    ));
    assert!(scrape.contains("taskroute_execution_duration_ms_count{provider=\"openai\"} 1"));
}
