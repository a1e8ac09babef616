//! Google Gemini adapter (`generateContent`)

use super::http::{build_client, elapsed_ms, send_json, token_count};
use super::{CallOptions, ExecutionResult, ProviderAdapter, ProviderError, ProviderKind};
use crate::config::ProviderEndpoint;
use crate::error::AppResult;
use async_trait::async_trait;
use std::time::Instant;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Adapter for the Gemini `models/{model}:generateContent` API
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout_seconds: u64,
}

impl GoogleProvider {
    /// Create an adapter for `base_url` (e.g. `https://generativelanguage.googleapis.com/v1beta`)
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_seconds: u64,
    ) -> AppResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: build_client(ProviderKind::Google)?,
            base_url,
            api_key,
            timeout_seconds,
        })
    }

    /// Create an adapter from the `[providers.google]` config section
    pub fn from_config(endpoint: &ProviderEndpoint) -> AppResult<Self> {
        let api_key = endpoint.api_key();
        if api_key.is_none() {
            tracing::warn!(
                provider = "google",
                api_key_env = %endpoint.api_key_env(),
                "API key environment variable is not set; requests will be sent unauthenticated"
            );
        }
        Self::new(endpoint.base_url(), api_key, endpoint.timeout_seconds())
    }

    fn request_body(prompt: &str, opts: Option<&CallOptions>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        if let Some(system) = opts.and_then(|o| o.system_prompt.as_deref()) {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }

        let mut generation = serde_json::Map::new();
        if let Some(temperature) = opts.and_then(|o| o.temperature) {
            generation.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        if let Some(max_tokens) = opts.and_then(|o| o.max_tokens) {
            generation.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
        }
        if !generation.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation);
        }
        body
    }

    fn parse_response(payload: serde_json::Value, latency_ms: u64) -> ExecutionResult {
        // Gemini splits output across parts; join them in order.
        let text = payload
            .pointer("/candidates/0/content/parts")
            .and_then(serde_json::Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(serde_json::Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default();

        ExecutionResult {
            text,
            tokens_in: token_count(&payload, "/usageMetadata/promptTokenCount"),
            tokens_out: token_count(&payload, "/usageMetadata/candidatesTokenCount"),
            latency_ms,
            raw_response: payload,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn call_model(
        &self,
        model_name: &str,
        prompt: &str,
        opts: Option<&CallOptions>,
    ) -> Result<ExecutionResult, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model_name);
        let mut request = self
            .client
            .post(&url)
            .json(&Self::request_body(prompt, opts));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.as_str());
        }

        tracing::debug!(
            provider = "google",
            model = %model_name,
            prompt_length = prompt.len(),
            "Calling model"
        );

        let start = Instant::now();
        let payload = send_json(request, ProviderKind::Google, model_name, self.timeout_seconds)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    provider = "google",
                    model = %model_name,
                    status = ?e.status(),
                    error = %e,
                    "Model call failed"
                );
            })?;
        let latency_ms = elapsed_ms(start);

        let result = Self::parse_response(payload, latency_ms);
        tracing::info!(
            provider = "google",
            model = %model_name,
            latency_ms = result.latency_ms,
            tokens_in = result.tokens_in,
            tokens_out = result.tokens_out,
            "Model call successful"
        );
        Ok(result)
    }
}
