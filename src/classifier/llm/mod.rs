//! LLM-backed classifier
//!
//! Sends the prompt to a small hosted model (OpenRouter by default) with a
//! system instruction listing the categories, then scans the reply for a
//! category label.

use super::{Classifier, ClassifierError, TaskCategory};
use crate::config::ClassifierConfig;
use crate::error::AppResult;
use crate::providers::{CallOptions, OpenAiProvider, ProviderAdapter};
use async_trait::async_trait;
use std::sync::Arc;


/// Instruction sent ahead of every prompt
pub const SYSTEM_PROMPT: &str = "You are a task classification engine. Your job is to classify a user's prompt into one of the following predefined categories:

- Code Generation
- Text Summarization
- Question Answering
- Creative Writing
- Other

Please respond with ONLY the category name and nothing else.";

/// Replies longer than this are treated as the model ignoring instructions
const MAX_CLASSIFIER_RESPONSE: usize = 1024;

/// Characters of a bad reply kept in error messages
const RESPONSE_PREVIEW_CHARS: usize = 200;

/// OpenRouter attribution headers
const REFERER_HEADER: (&str, &str) = ("HTTP-Referer", "http://localhost:3000");
const TITLE_HEADER: (&str, &str) = ("X-Title", "LLM Router");

/// Classifier that asks a hosted model for the category
pub struct LlmClassifier {
    backend: Arc<dyn ProviderAdapter>,
    model: String,
}

impl LlmClassifier {
    /// Use `backend` to run `model` for every classification
    pub fn new(backend: Arc<dyn ProviderAdapter>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Build an OpenAI-compatible client for `[classifier]`
    pub fn from_config(config: &ClassifierConfig) -> AppResult<Self> {
        let endpoint = config.endpoint();
        let api_key = endpoint.api_key();
        if api_key.is_none() {
            tracing::warn!(
                api_key_env = %endpoint.api_key_env(),
                "Classifier API key is not set; every prompt will be classified as \"Other\" \
                if the backend requires authentication"
            );
        }

        let backend = OpenAiProvider::new(endpoint.base_url(), api_key, endpoint.timeout_seconds())?
            .with_header(REFERER_HEADER.0, REFERER_HEADER.1)
            .with_header(TITLE_HEADER.0, TITLE_HEADER.1);

        Ok(Self::new(Arc::new(backend), &config.model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Find the first category (in [`TaskCategory::ALL`] order) named in `response`
    ///
    /// Matching is a case-insensitive substring search, so "Category: code
    /// generation." resolves to Code Generation.
    pub(crate) fn parse_category(response: &str) -> Result<TaskCategory, ClassifierError> {
        let trimmed = response.trim();
        if trimmed.is_empty() {
            return Err(ClassifierError::EmptyResponse);
        }
        if trimmed.len() > MAX_CLASSIFIER_RESPONSE {
            return Err(ClassifierError::SizeExceeded {
                size: trimmed.len(),
                max_size: MAX_CLASSIFIER_RESPONSE,
            });
        }

        let normalized = trimmed.to_lowercase();
        TaskCategory::ALL
            .into_iter()
            .find(|category| normalized.contains(&category.label().to_lowercase()))
            .ok_or_else(|| {
                let preview = if trimmed.chars().count() > RESPONSE_PREVIEW_CHARS {
                    format!(
                        "{}...",
                        trimmed.chars().take(RESPONSE_PREVIEW_CHARS).collect::<String>()
                    )
                } else {
                    trimmed.to_string()
                };
                ClassifierError::Inconclusive {
                    response: preview,
                    response_length: trimmed.len(),
                }
            })
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn try_classify(&self, prompt: &str) -> Result<TaskCategory, ClassifierError> {
        let opts = CallOptions {
            system_prompt: Some(SYSTEM_PROMPT.to_string()),
            ..CallOptions::default()
        };

        let result = self
            .backend
            .call_model(&self.model, prompt, Some(&opts))
            .await?;

        let category = Self::parse_category(&result.text)?;
        tracing::debug!(
            model = %self.model,
            category = %category,
            latency_ms = result.latency_ms,
            "LLM classification complete"
        );
        Ok(category)
    }
}
