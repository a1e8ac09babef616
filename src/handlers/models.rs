//! Models endpoint handler
//!
//! Lists the routing catalog via GET /models.

use crate::classifier::TaskCategory;
use crate::handlers::AppState;
use crate::models::ModelCandidate;
use axum::{Json, extract::State};
use serde::Serialize;

/// Response for GET /models
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    /// Candidate lists in category order
    pub categories: Vec<CategoryModels>,
    /// Last-resort candidate when nothing else is selectable
    #[serde(rename = "defaultCandidate")]
    pub default_candidate: ModelCandidate,
}

/// Candidates configured for one task category
#[derive(Debug, Serialize)]
pub struct CategoryModels {
    pub category: TaskCategory,
    pub candidates: Vec<ModelCandidate>,
}

/// GET /models handler
pub async fn handler(State(state): State<AppState>) -> Json<ModelsResponse> {
    let catalog = state.selector().catalog();
    let categories: Vec<CategoryModels> = catalog
        .iter()
        .map(|(category, candidates)| CategoryModels {
            category,
            candidates: candidates.to_vec(),
        })
        .collect();

    tracing::debug!(
        categories = categories.len(),
        candidates = categories.iter().map(|c| c.candidates.len()).sum::<usize>(),
        "Listed catalog for /models endpoint"
    );

    Json(ModelsResponse {
        categories,
        default_candidate: catalog.default_candidate().clone(),
    })
}
