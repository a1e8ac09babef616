//! Execute-with-fallback
//!
//! Invokes the selected candidate through its provider adapter. If that call
//! fails and the candidate declares a fallback, the fallback is invoked
//! exactly once. There is no further retry.

use crate::metrics::{AttemptOutcome, Metrics};
use crate::models::ModelCandidate;
use crate::providers::{ExecutionResult, ProviderError, ProviderKind, ProviderRegistry};
use std::sync::Arc;

/// Primary and fallback (if any) both failed
///
/// `source` is the primary attempt's error; the fallback's error, when a
/// fallback ran, is kept alongside it.
#[derive(Debug, thiserror::Error)]
#[error("execution of '{candidate}' failed: {source}{}", fallback_note(.fallback))]
pub struct ExecutionError {
    candidate: String,
    source: ProviderError,
    fallback: Option<(String, ProviderError)>,
}

fn fallback_note(fallback: &Option<(String, ProviderError)>) -> String {
    fallback
        .as_ref()
        .map(|(name, error)| format!("; fallback '{}' also failed: {}", name, error))
        .unwrap_or_default()
}

impl ExecutionError {
    pub fn new(candidate: impl Into<String>, source: ProviderError) -> Self {
        Self {
            candidate: candidate.into(),
            source,
            fallback: None,
        }
    }

    /// Record that the fallback `name` was tried and failed with `error`
    pub fn with_fallback_failure(mut self, name: impl Into<String>, error: ProviderError) -> Self {
        self.fallback = Some((name.into(), error));
        self
    }

    /// Name of the candidate the selector chose
    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    /// Name of the fallback that was tried, if any
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_ref().map(|(name, _)| name.as_str())
    }

    /// Error from the primary attempt
    pub fn provider_error(&self) -> &ProviderError {
        &self.source
    }

    pub fn fallback_error(&self) -> Option<&ProviderError> {
        self.fallback.as_ref().map(|(_, error)| error)
    }
}

/// A successful execution and which model produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub result: ExecutionResult,
    pub model: String,
    pub provider: ProviderKind,
    pub fallback_used: bool,
}

pub struct Executor {
    providers: Arc<ProviderRegistry>,
    metrics: Arc<Metrics>,
}

impl Executor {
    pub fn new(providers: Arc<ProviderRegistry>, metrics: Arc<Metrics>) -> Self {
        Self { providers, metrics }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Run `prompt` on `candidate`, falling back once on failure
    pub async fn execute(
        &self,
        candidate: &ModelCandidate,
        prompt: &str,
        request_id: &str,
    ) -> Result<Execution, ExecutionError> {
        let primary = self
            .attempt(candidate.provider(), candidate.name(), prompt, request_id)
            .await;

        let primary_error = match primary {
            Ok(result) => {
                return Ok(Execution {
                    result,
                    model: candidate.name().to_string(),
                    provider: candidate.provider(),
                    fallback_used: false,
                });
            }
            Err(e) => e,
        };

        let Some(fallback) = candidate.fallback() else {
            tracing::error!(
                request_id = %request_id,
                model = %candidate.name(),
                provider = %candidate.provider(),
                status = ?primary_error.status(),
                error_body = ?primary_error.body(),
                error = %primary_error,
                "Model call failed and candidate has no fallback"
            );
            return Err(ExecutionError::new(candidate.name(), primary_error));
        };

        tracing::warn!(
            request_id = %request_id,
            model = %candidate.name(),
            provider = %candidate.provider(),
            fallback_model = %fallback.name(),
            fallback_provider = %fallback.provider(),
            status = ?primary_error.status(),
            error = %primary_error,
            "Model call failed, invoking fallback"
        );
        self.metrics.fallback_invoked(fallback.provider());

        match self
            .attempt(fallback.provider(), fallback.name(), prompt, request_id)
            .await
        {
            Ok(result) => Ok(Execution {
                result,
                model: fallback.name().to_string(),
                provider: fallback.provider(),
                fallback_used: true,
            }),
            Err(fallback_error) => {
                tracing::error!(
                    request_id = %request_id,
                    model = %candidate.name(),
                    fallback_model = %fallback.name(),
                    primary_error = %primary_error,
                    status = ?fallback_error.status(),
                    error_body = ?fallback_error.body(),
                    error = %fallback_error,
                    "Primary and fallback model calls both failed"
                );
                Err(ExecutionError::new(candidate.name(), primary_error)
                    .with_fallback_failure(fallback.name(), fallback_error))
            }
        }
    }

    /// One provider call, with outcome and latency recorded
    async fn attempt(
        &self,
        provider: ProviderKind,
        model: &str,
        prompt: &str,
        request_id: &str,
    ) -> Result<ExecutionResult, ProviderError> {
        let result = match self.providers.get(provider) {
            Some(adapter) => {
                tracing::debug!(
                    request_id = %request_id,
                    model = %model,
                    provider = %provider,
                    "Invoking model"
                );
                adapter.call_model(model, prompt, None).await
            }
            None => Err(ProviderError::Unavailable {
                provider,
                model: model.to_string(),
            }),
        };

        self.metrics
            .record_attempt(provider, AttemptOutcome::from_result(&result));
        if let Ok(execution) = &result
            && let Err(e) = self
                .metrics
                .record_execution_duration(provider, execution.latency_ms as f64)
        {
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                "Metrics recording failed (non-fatal)"
            );
            self.metrics
                .metrics_recording_failure("record_execution_duration");
        }
        result
    }
}
