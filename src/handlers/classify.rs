//! Classify endpoint handler
//!
//! Handles POST /api/classify: returns the task category for a prompt without
//! executing it.

use super::extractor::{FieldValue, ValidJson, ValidateRequest, prompt_field};
use crate::classifier::{TaskCategory, resolve_category};
use crate::error::FieldError;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyRequest {
    prompt: String,
}

impl ClassifyRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[derive(Debug, Deserialize)]
pub struct RawClassifyRequest {
    #[serde(default)]
    prompt: Option<FieldValue<String>>,
}

impl ValidateRequest for ClassifyRequest {
    type Raw = RawClassifyRequest;

    fn validate(raw: RawClassifyRequest) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        match prompt_field(raw.prompt, &mut errors) {
            Some(prompt) => Ok(Self { prompt }),
            None => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResponse {
    pub category: TaskCategory,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidJson(request): ValidJson<ClassifyRequest>,
) -> Json<ClassifyResponse> {
    let request_id = request_id.to_string();
    let category = resolve_category(
        state.classifier().as_ref(),
        request.prompt(),
        state.metrics(),
        &request_id,
    )
    .await;

    tracing::info!(
        request_id = %request_id,
        category = %category,
        "Prompt classified"
    );

    Json(ClassifyResponse { category })
}
