//! Prompt classification into task categories
//!
//! A [`Classifier`] maps a prompt to exactly one [`TaskCategory`]. Failures
//! never escape the classifier boundary: [`Classifier::classify`] and
//! [`resolve_category`] turn every error into [`TaskCategory::Other`].

pub mod keyword;
pub mod llm;

pub use keyword::KeywordClassifier;
pub use llm::LlmClassifier;

use crate::config::{ClassifierConfig, ClassifierStrategy};
use crate::error::AppResult;
use crate::metrics::Metrics;
use crate::providers::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Closed set of task categories
///
/// Serialized with its human label (`"Code Generation"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskCategory {
    CodeGeneration,
    TextSummarization,
    QuestionAnswering,
    CreativeWriting,
    Other,
}

impl TaskCategory {
    /// Every category, in classification order. `Other` is last.
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::CodeGeneration,
        TaskCategory::TextSummarization,
        TaskCategory::QuestionAnswering,
        TaskCategory::CreativeWriting,
        TaskCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::CodeGeneration => "Code Generation",
            Self::TextSummarization => "Text Summarization",
            Self::QuestionAnswering => "Question Answering",
            Self::CreativeWriting => "Creative Writing",
            Self::Other => "Other",
        }
    }

    /// Prometheus-friendly label
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::CodeGeneration => "code_generation",
            Self::TextSummarization => "text_summarization",
            Self::QuestionAnswering => "question_answering",
            Self::CreativeWriting => "creative_writing",
            Self::Other => "other",
        }
    }

    /// Lenient lookup: unknown labels resolve to `Other`
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Self::Other)
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label is not one of the five task categories
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for TaskCategory {
    type Err = UnknownCategory;

    /// Exact, case-sensitive label match
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl Serialize for TaskCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TaskCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Why a classification attempt did not produce a category
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classifier returned an empty response")]
    EmptyResponse,

    /// No category label found in the response
    ///
    /// `response` is a preview truncated to 200 characters.
    #[error("classifier response named no known category ({response_length} bytes): {response}")]
    Inconclusive {
        response: String,
        response_length: usize,
    },

    #[error("classifier response exceeded {max_size} bytes (got {size} bytes)")]
    SizeExceeded { size: usize, max_size: usize },

    #[error("classifier backend call failed: {0}")]
    Provider(#[from] ProviderError),
}

impl ClassifierError {
    /// Bounded label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyResponse => "empty_response",
            Self::Inconclusive { .. } => "inconclusive",
            Self::SizeExceeded { .. } => "size_exceeded",
            Self::Provider(_) => "provider",
        }
    }
}

/// Maps prompts to task categories
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Classify `prompt`, surfacing why classification failed
    async fn try_classify(&self, prompt: &str) -> Result<TaskCategory, ClassifierError>;

    /// Classify `prompt`; any failure resolves to `Other`
    async fn classify(&self, prompt: &str) -> TaskCategory {
        match self.try_classify(prompt).await {
            Ok(category) => category,
            Err(e) => {
                tracing::warn!(
                    classifier = self.name(),
                    reason = e.reason(),
                    error = %e,
                    "Classification failed, falling back to \"Other\""
                );
                TaskCategory::Other
            }
        }
    }
}

/// Classify `prompt`, counting every fallback to `Other` in metrics
pub async fn resolve_category(
    classifier: &dyn Classifier,
    prompt: &str,
    metrics: &Metrics,
    request_id: &str,
) -> TaskCategory {
    match classifier.try_classify(prompt).await {
        Ok(category) => {
            tracing::debug!(
                request_id = %request_id,
                classifier = classifier.name(),
                category = %category,
                "Prompt classified"
            );
            category
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                classifier = classifier.name(),
                reason = e.reason(),
                error = %e,
                "Classification failed, falling back to \"Other\""
            );
            metrics.classification_fallback(e.reason());
            TaskCategory::Other
        }
    }
}

/// Build the classifier selected by `[classifier].strategy`
pub fn from_config(config: &ClassifierConfig) -> AppResult<Arc<dyn Classifier>> {
    let classifier: Arc<dyn Classifier> = match config.strategy {
        ClassifierStrategy::Llm => Arc::new(LlmClassifier::from_config(config)?),
        ClassifierStrategy::Keyword => Arc::new(KeywordClassifier::new()),
    };
    tracing::info!(classifier = classifier.name(), "Classifier configured");
    Ok(classifier)
}
