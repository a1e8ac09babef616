//! OpenAI chat-completions adapter
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint. The LLM
//! classifier reuses it against OpenRouter.

use super::http::{build_client, elapsed_ms, send_json, token_count};
use super::{CallOptions, ExecutionResult, ProviderAdapter, ProviderError, ProviderKind};
use crate::config::ProviderEndpoint;
use crate::error::AppResult;
use async_trait::async_trait;
use std::time::Instant;

/// Adapter for the OpenAI chat-completions API
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout_seconds: u64,
    extra_headers: Vec<(String, String)>,
}

impl OpenAiProvider {
    /// Create an adapter for `base_url` (e.g. `https://api.openai.com/v1`)
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_seconds: u64,
    ) -> AppResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: build_client(ProviderKind::OpenAi)?,
            base_url,
            api_key,
            timeout_seconds,
            extra_headers: Vec::new(),
        })
    }

    /// Create an adapter from the `[providers.openai]` config section
    pub fn from_config(endpoint: &ProviderEndpoint) -> AppResult<Self> {
        let api_key = endpoint.api_key();
        if api_key.is_none() {
            tracing::warn!(
                provider = "openai",
                api_key_env = %endpoint.api_key_env(),
                "API key environment variable is not set; requests will be sent unauthenticated"
            );
        }
        Self::new(endpoint.base_url(), api_key, endpoint.timeout_seconds())
    }

    /// Send an additional header with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(model_name: &str, prompt: &str, opts: Option<&CallOptions>) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = opts.and_then(|o| o.system_prompt.as_deref()) {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": prompt }));

        let mut body = serde_json::json!({
            "model": model_name,
            "messages": messages,
        });
        if let Some(temperature) = opts.and_then(|o| o.temperature) {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = opts.and_then(|o| o.max_tokens) {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    fn parse_response(payload: serde_json::Value, latency_ms: u64) -> ExecutionResult {
        let text = payload
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        ExecutionResult {
            text,
            tokens_in: token_count(&payload, "/usage/prompt_tokens"),
            tokens_out: token_count(&payload, "/usage/completion_tokens"),
            latency_ms,
            raw_response: payload,
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn call_model(
        &self,
        model_name: &str,
        prompt: &str,
        opts: Option<&CallOptions>,
    ) -> Result<ExecutionResult, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .json(&Self::request_body(model_name, prompt, opts));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        for (name, value) in &self.extra_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!(
            provider = "openai",
            model = %model_name,
            prompt_length = prompt.len(),
            "Calling model"
        );

        let start = Instant::now();
        let payload = send_json(request, ProviderKind::OpenAi, model_name, self.timeout_seconds)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    provider = "openai",
                    model = %model_name,
                    status = ?e.status(),
                    error = %e,
                    "Model call failed"
                );
            })?;
        let latency_ms = elapsed_ms(start);

        let result = Self::parse_response(payload, latency_ms);
        tracing::info!(
            provider = "openai",
            model = %model_name,
            latency_ms = result.latency_ms,
            tokens_in = result.tokens_in,
            tokens_out = result.tokens_out,
            "Model call successful"
        );
        Ok(result)
    }
}
