//! Candidate catalog: task category to ordered candidate list
//!
//! Built once at startup, validated, then shared read-only behind an `Arc`.
//! List order is insertion order and carries no ranking meaning; it only
//! breaks ties in the selector.

use super::ModelCandidate;
use crate::classifier::TaskCategory;
use crate::error::{AppError, AppResult};
use crate::providers::ProviderKind;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<TaskCategory, Vec<ModelCandidate>>,
    /// First catch-all candidate, the selector's last resort
    default_candidate: ModelCandidate,
}

impl Catalog {
    /// Validate `entries` and build a catalog
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a category is listed twice or empty,
    /// the `Other` list is missing, or a candidate has an empty name,
    /// a negative or non-finite quality, a non-positive or non-finite cost,
    /// zero latency, a fallback pointing at itself, or duplicates another
    /// candidate (same name and provider) in its category.
    pub fn new(
        entries: impl IntoIterator<Item = (TaskCategory, Vec<ModelCandidate>)>,
    ) -> AppResult<Self> {
        let mut map = BTreeMap::new();
        for (category, candidates) in entries {
            if candidates.is_empty() {
                return Err(AppError::Config(format!(
                    "catalog category '{}' has no candidates; remove the section or add at least one",
                    category
                )));
            }
            validate_candidates(category, &candidates)?;
            if map.insert(category, candidates).is_some() {
                return Err(AppError::Config(format!(
                    "catalog category '{}' is listed more than once",
                    category
                )));
            }
        }

        let default_candidate = map
            .get(&TaskCategory::Other)
            .and_then(|list| list.first())
            .cloned()
            .ok_or_else(|| {
                AppError::Config(
                    "catalog must define a non-empty 'Other' list; it is used for unclassified \
                    prompts and for categories without their own list"
                        .to_string(),
                )
            })?;

        Ok(Self {
            entries: map,
            default_candidate,
        })
    }

    /// The built-in routing table, validated like any configured catalog
    pub fn builtin() -> AppResult<Self> {
        Self::new(builtin_entries())
    }

    /// Candidates for `category`, or the catch-all list when it has none
    ///
    /// Never empty.
    pub fn lookup(&self, category: TaskCategory) -> &[ModelCandidate] {
        self.entries
            .get(&category)
            .or_else(|| self.entries.get(&TaskCategory::Other))
            .map(Vec::as_slice)
            .unwrap_or(std::slice::from_ref(&self.default_candidate))
    }

    /// The `Other` list
    pub fn catch_all(&self) -> &[ModelCandidate] {
        self.lookup(TaskCategory::Other)
    }

    /// First candidate of the catch-all list
    pub fn default_candidate(&self) -> &ModelCandidate {
        &self.default_candidate
    }

    /// Whether `category` has its own list
    pub fn has_list(&self, category: TaskCategory) -> bool {
        self.entries.contains_key(&category)
    }

    /// Every provider referenced by a candidate or a fallback
    pub fn providers(&self) -> BTreeSet<ProviderKind> {
        self.entries
            .values()
            .flatten()
            .flat_map(|candidate| {
                std::iter::once(candidate.provider())
                    .chain(candidate.fallback().map(|fallback| fallback.provider()))
            })
            .collect()
    }

    /// Configured lists in category order
    pub fn iter(&self) -> impl Iterator<Item = (TaskCategory, &[ModelCandidate])> {
        self.entries
            .iter()
            .map(|(category, candidates)| (*category, candidates.as_slice()))
    }
}

fn validate_candidates(category: TaskCategory, candidates: &[ModelCandidate]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for candidate in candidates {
        let invalid = |reason: String| {
            AppError::Config(format!(
                "catalog category '{}': candidate '{}' ({}) {}",
                category,
                candidate.name(),
                candidate.provider(),
                reason
            ))
        };

        if candidate.name().trim().is_empty() {
            return Err(AppError::Config(format!(
                "catalog category '{}' has a candidate with an empty name",
                category
            )));
        }
        if !candidate.est_quality().is_finite() || candidate.est_quality() < 0.0 {
            return Err(invalid(format!(
                "has invalid est_quality {}; must be a finite, non-negative number",
                candidate.est_quality()
            )));
        }
        let cost = candidate.est_cost_per_1k_tokens();
        if !cost.is_finite() || cost <= 0.0 {
            return Err(invalid(format!(
                "has invalid est_cost_per_1k_tokens {}; must be a finite number greater than 0",
                cost
            )));
        }
        if candidate.est_latency_ms() == 0 {
            return Err(invalid("has est_latency_ms = 0; must be greater than 0".to_string()));
        }
        if let Some(fallback) = candidate.fallback() {
            if fallback.name().trim().is_empty() {
                return Err(invalid("has a fallback with an empty name".to_string()));
            }
            if fallback.name() == candidate.name() && fallback.provider() == candidate.provider() {
                return Err(invalid("falls back to itself".to_string()));
            }
        }
        if !seen.insert((candidate.name(), candidate.provider())) {
            return Err(invalid("is listed more than once".to_string()));
        }
    }
    Ok(())
}

/// The routing table shipped with the binary
fn builtin_entries() -> Vec<(TaskCategory, Vec<ModelCandidate>)> {
    use ProviderKind::{Google, OpenAi};

    let gpt5_pro = || ModelCandidate::new("gpt-5-pro", OpenAi, 10.0, 0.03, 1500)
        .with_fallback("gpt-5", OpenAi);
    let gemini_pro = || ModelCandidate::new("gemini-2.5-pro", Google, 10.0, 0.03, 1400)
        .with_fallback("gemini-2.5-flash", Google);

    vec![
        (
            TaskCategory::CodeGeneration,
            vec![
                gpt5_pro(),
                gemini_pro(),
                ModelCandidate::new("gpt-5", OpenAi, 9.0, 0.015, 1200)
                    .with_fallback("gpt-5-mini", OpenAi),
            ],
        ),
        (
            TaskCategory::TextSummarization,
            vec![
                ModelCandidate::new("gemini-2.5-flash", Google, 8.0, 0.002, 500)
                    .with_fallback("gemini-2.0-flash", Google),
                ModelCandidate::new("gpt-5-mini", OpenAi, 8.0, 0.003, 600)
                    .with_fallback("gpt-4o", OpenAi),
            ],
        ),
        (
            TaskCategory::QuestionAnswering,
            vec![gpt5_pro(), gemini_pro()],
        ),
        (TaskCategory::CreativeWriting, vec![gpt5_pro()]),
        (
            TaskCategory::Other,
            vec![
                ModelCandidate::new("gpt-5-nano", OpenAi, 6.0, 0.001, 300),
                ModelCandidate::new("gemini-2.5-flash-lite", Google, 6.0, 0.001, 250),
            ],
        ),
    ]
}
