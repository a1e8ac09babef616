//! Execute endpoint handler
//!
//! Handles POST /api/execute: classify the prompt, select a candidate, run it
//! with fallback, and return the provider output.

use super::extractor::{FieldValue, ValidJson, ValidateRequest, prompt_field};
use crate::classifier::{TaskCategory, resolve_category};
use crate::error::{AppError, FieldError};
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::models::Priority;
use crate::providers::{ExecutionResult, ProviderKind};
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

/// Validated execute request
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteRequest {
    prompt: String,
    priority: Option<Priority>,
    latency_budget_ms: Option<u64>,
}

impl ExecuteRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Priority, if the caller sent one
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn latency_budget_ms(&self) -> Option<u64> {
        self.latency_budget_ms
    }
}

/// Execute request as sent on the wire
#[derive(Debug, Deserialize)]
pub struct RawExecuteRequest {
    #[serde(default)]
    prompt: Option<FieldValue<String>>,
    #[serde(default)]
    priority: Option<FieldValue<Priority>>,
    #[serde(default, rename = "latencyBudgetMs")]
    latency_budget_ms: Option<FieldValue<u64>>,
}

impl ValidateRequest for ExecuteRequest {
    type Raw = RawExecuteRequest;

    fn validate(raw: RawExecuteRequest) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let prompt = prompt_field(raw.prompt, &mut errors);

        let priority = match raw.priority {
            None => None,
            Some(FieldValue::Valid(priority)) => Some(priority),
            Some(FieldValue::Invalid(_)) => {
                errors.push(FieldError::new(
                    "priority",
                    "Priority must be one of: cost, latency, quality",
                ));
                None
            }
        };

        let latency_budget_ms = match raw.latency_budget_ms {
            None => None,
            Some(FieldValue::Valid(budget)) if budget > 0 => Some(budget),
            Some(_) => {
                errors.push(FieldError::new(
                    "latencyBudgetMs",
                    "latencyBudgetMs must be a positive integer",
                ));
                None
            }
        };

        match prompt {
            Some(prompt) if errors.is_empty() => Ok(Self {
                prompt,
                priority,
                latency_budget_ms,
            }),
            _ => Err(errors),
        }
    }
}

/// Execute response
///
/// Flattens the provider result (`text`, `tokens_in`, `tokens_out`,
/// `latencyMs`, `rawResponse`) and adds routing details.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    #[serde(flatten)]
    pub result: ExecutionResult,
    pub model: String,
    pub provider: ProviderKind,
    #[serde(rename = "taskCategory")]
    pub task_category: TaskCategory,
    #[serde(rename = "fallbackUsed")]
    pub fallback_used: bool,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidJson(request): ValidJson<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, AppError> {
    let request_id = request_id.to_string();
    let routing = &state.config().routing;
    let priority = request.priority().unwrap_or(routing.default_priority);
    let latency_budget_ms = request
        .latency_budget_ms()
        .or(routing.default_latency_budget_ms);

    tracing::debug!(
        request_id = %request_id,
        prompt_length = request.prompt().len(),
        priority = %priority,
        latency_budget_ms = ?latency_budget_ms,
        "Received execute request"
    );

    let category = resolve_category(
        state.classifier().as_ref(),
        request.prompt(),
        state.metrics(),
        &request_id,
    )
    .await;

    if let Err(e) = state.metrics().record_request(category, priority) {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            category = %category,
            priority = %priority,
            "Metrics recording failed (non-fatal)"
        );
        state.metrics().metrics_recording_failure("record_request");
    }

    let selection = state
        .selector()
        .decide(category, priority, latency_budget_ms);

    tracing::info!(
        request_id = %request_id,
        category = %category,
        priority = %priority,
        model = %selection.candidate.name(),
        provider = %selection.candidate.provider(),
        budget_reverted = selection.budget_reverted,
        "Routing decision made"
    );

    let execution = state
        .executor()
        .execute(selection.candidate, request.prompt(), &request_id)
        .await?;

    tracing::info!(
        request_id = %request_id,
        model = %execution.model,
        provider = %execution.provider,
        fallback_used = execution.fallback_used,
        latency_ms = execution.result.latency_ms,
        tokens_in = execution.result.tokens_in,
        tokens_out = execution.result.tokens_out,
        "Request completed successfully"
    );

    Ok(Json(ExecuteResponse {
        result: execution.result,
        model: execution.model,
        provider: execution.provider,
        task_category: category,
        fallback_used: execution.fallback_used,
    }))
}
