//! Provider adapters for hosted LLM backends
//!
//! Each backend is one [`ProviderKind`] variant with exactly one
//! [`ProviderAdapter`] implementation. The executor looks adapters up by tag
//! in a [`ProviderRegistry`], so adding a backend means adding a variant and
//! an implementation rather than branching on strings.
//!
//! Adapters never retry. Retry/fallback policy belongs to the executor.

pub mod google;
mod http;
pub mod openai;

pub use google::GoogleProvider;
pub use openai::OpenAiProvider;

use crate::config::ProvidersConfig;
use crate::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Integrated backend tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Google,
}

impl ProviderKind {
    /// All provider tags, in declaration order
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Google];

    /// Label used in logs, metrics, and config
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional per-call parameters forwarded to the backend
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// System instruction sent ahead of the prompt
    pub system_prompt: Option<String>,
    /// Override temperature (0.0 to 2.0)
    pub temperature: Option<f64>,
    /// Override max output tokens
    pub max_tokens: Option<u32>,
}

/// Output of one successful model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub text: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
    #[serde(rename = "latencyMs")]
    pub latency_ms: u64,
    /// Provider payload, passed through unmodified
    #[serde(rename = "rawResponse")]
    pub raw_response: serde_json::Value,
}

/// A single provider invocation failed
///
/// Carries the HTTP status (when the backend answered) and the raw error body
/// for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request for model '{model}' failed to send: {message}")]
    Transport {
        provider: ProviderKind,
        model: String,
        message: String,
    },

    #[error("{provider} request for model '{model}' timed out after {timeout_seconds}s")]
    Timeout {
        provider: ProviderKind,
        model: String,
        timeout_seconds: u64,
    },

    #[error("{provider} returned HTTP {status} for model '{model}': {body}")]
    Status {
        provider: ProviderKind,
        model: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an unreadable response for model '{model}': {details}")]
    InvalidResponse {
        provider: ProviderKind,
        model: String,
        details: String,
    },

    #[error("no adapter registered for provider {provider} (model '{model}')")]
    Unavailable { provider: ProviderKind, model: String },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Transport { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Status { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::Unavailable { provider, .. } => *provider,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Transport { model, .. }
            | Self::Timeout { model, .. }
            | Self::Status { model, .. }
            | Self::InvalidResponse { model, .. }
            | Self::Unavailable { model, .. } => model,
        }
    }

    /// HTTP status returned by the backend, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw error body returned by the backend
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Bounded label for metrics
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

/// Capability to invoke a named model on one backend
///
/// Implementations must not retry internally.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which backend this adapter serves
    fn kind(&self) -> ProviderKind;

    /// Invoke `model_name` with `prompt`
    async fn call_model(
        &self,
        model_name: &str,
        prompt: &str,
        opts: Option<&CallOptions>,
    ) -> Result<ExecutionResult, ProviderError>;
}

/// Adapters keyed by provider tag
///
/// Built once at startup and shared read-only across requests.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the HTTP adapters for every configured provider
    pub fn from_config(config: &ProvidersConfig) -> AppResult<Self> {
        let registry = Self::new()
            .with(Arc::new(OpenAiProvider::from_config(&config.openai)?))
            .with(Arc::new(GoogleProvider::from_config(&config.google)?));
        Ok(registry)
    }

    /// Register an adapter under its own tag, replacing any previous one
    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&Arc<dyn ProviderAdapter>> {
        self.adapters.get(&kind)
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Registered tags, sorted
    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.adapters.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticAdapter(ProviderKind);

    #[async_trait]
    impl ProviderAdapter for StaticAdapter {
        fn kind(&self) -> ProviderKind {
            self.0
        }

        async fn call_model(
            &self,
            model_name: &str,
            _prompt: &str,
            _opts: Option<&CallOptions>,
        ) -> Result<ExecutionResult, ProviderError> {
            Ok(ExecutionResult {
                text: model_name.to_string(),
                tokens_in: 1,
                tokens_out: 1,
                latency_ms: 0,
                raw_response: serde_json::Value::Null,
            })
        }
    }

    #[test]
    fn test_provider_kind_serde() {
        assert_eq!(
            serde_json::from_str::<ProviderKind>(r#""openai""#).unwrap(),
            ProviderKind::OpenAi
        );
        assert_eq!(
            serde_json::from_str::<ProviderKind>(r#""google""#).unwrap(),
            ProviderKind::Google
        );
        assert!(serde_json::from_str::<ProviderKind>(r#""anthropic""#).is_err());
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
    }

    #[test]
    fn test_registry_registers_by_kind() {
        let registry = ProviderRegistry::new()
            .with(Arc::new(StaticAdapter(ProviderKind::Google)))
            .with(Arc::new(StaticAdapter(ProviderKind::OpenAi)));

        assert!(registry.contains(ProviderKind::OpenAi));
        assert!(registry.contains(ProviderKind::Google));
        assert_eq!(
            registry.kinds(),
            vec![ProviderKind::OpenAi, ProviderKind::Google]
        );
    }

    #[tokio::test]
    async fn test_registry_dispatches_to_adapter() {
        let registry = ProviderRegistry::new().with(Arc::new(StaticAdapter(ProviderKind::Google)));
        let adapter = registry.get(ProviderKind::Google).expect("adapter registered");
        let result = adapter.call_model("gemini-2.5-flash", "hi", None).await.unwrap();
        assert_eq!(result.text, "gemini-2.5-flash");
        assert!(registry.get(ProviderKind::OpenAi).is_none());
    }

    #[test]
    fn test_execution_result_wire_names() {
        let result = ExecutionResult {
            text: "hello".to_string(),
            tokens_in: 3,
            tokens_out: 5,
            latency_ms: 42,
            raw_response: serde_json::json!({"id": "abc"}),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["tokens_in"], 3);
        assert_eq!(json["tokens_out"], 5);
        assert_eq!(json["latencyMs"], 42);
        assert_eq!(json["rawResponse"]["id"], "abc");
    }

    #[test]
    fn test_provider_error_accessors() {
        let err = ProviderError::Status {
            provider: ProviderKind::OpenAi,
            model: "gpt-5".to_string(),
            status: 429,
            body: r#"{"error":"rate limited"}"#.to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.body(), Some(r#"{"error":"rate limited"}"#));
        assert_eq!(err.model(), "gpt-5");
        assert_eq!(err.provider(), ProviderKind::OpenAi);
        assert_eq!(err.kind_label(), "status");

        let timeout = ProviderError::Timeout {
            provider: ProviderKind::Google,
            model: "gemini-2.5-pro".to_string(),
            timeout_seconds: 5,
        };
        assert_eq!(timeout.status(), None);
        assert_eq!(timeout.body(), None);
        assert!(timeout.to_string().contains("timed out after 5s"));
    }
}
