//! Candidate selection: budget filter, then priority ranking
//!
//! Given a task category, a priority, and an optional latency budget, picks
//! exactly one candidate from the catalog:
//!
//! 1. Resolve the category's list (or the catch-all list).
//! 2. Keep candidates whose `est_latency_ms` fits the budget. If none fit,
//!    revert to the full list; this is logged and counted, never an error.
//! 3. Rank by priority. Ties keep the earliest candidate in catalog order.
//! 4. If ranking yields nothing, use the first catch-all candidate.

use super::{Catalog, ModelCandidate};
use crate::classifier::TaskCategory;
use crate::metrics::Metrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-specified optimisation target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Best quality per unit cost
    Cost,
    /// Lowest estimated latency
    Latency,
    /// Highest estimated quality
    #[default]
    Quality,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Latency => "latency",
            Self::Quality => "quality",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub candidate: &'a ModelCandidate,
    /// No candidate met the latency budget, so the full list was ranked
    pub budget_reverted: bool,
}

/// Picks one candidate per request from a shared catalog
pub struct CandidateSelector {
    catalog: Arc<Catalog>,
    metrics: Arc<Metrics>,
}

impl CandidateSelector {
    pub fn new(catalog: Arc<Catalog>, metrics: Arc<Metrics>) -> Self {
        Self { catalog, metrics }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Select a candidate for `category`
    pub fn select(
        &self,
        category: TaskCategory,
        priority: Priority,
        latency_budget_ms: Option<u64>,
    ) -> &ModelCandidate {
        self.decide(category, priority, latency_budget_ms).candidate
    }

    /// Select a candidate and report whether the budget filter was reverted
    pub fn decide(
        &self,
        category: TaskCategory,
        priority: Priority,
        latency_budget_ms: Option<u64>,
    ) -> Selection<'_> {
        let candidates = self.catalog.lookup(category);

        let (pool, budget_reverted) = match latency_budget_ms {
            Some(budget) => {
                let within: Vec<&ModelCandidate> = candidates
                    .iter()
                    .filter(|candidate| candidate.est_latency_ms() <= budget)
                    .collect();
                if within.is_empty() {
                    tracing::warn!(
                        category = %category,
                        latency_budget_ms = budget,
                        fastest_ms = ?candidates.iter().map(ModelCandidate::est_latency_ms).min(),
                        "No candidate meets the latency budget, ranking the full list"
                    );
                    self.metrics.budget_reversion(category);
                    (candidates.iter().collect(), true)
                } else {
                    (within, false)
                }
            }
            None => (candidates.iter().collect(), false),
        };

        let candidate = rank(&pool, priority).unwrap_or_else(|| {
            tracing::warn!(
                category = %category,
                priority = %priority,
                "Ranking produced no candidate, using the catch-all default"
            );
            self.catalog.default_candidate()
        });

        tracing::debug!(
            category = %category,
            priority = %priority,
            latency_budget_ms = ?latency_budget_ms,
            model = %candidate.name(),
            provider = %candidate.provider(),
            budget_reverted,
            pool_size = pool.len(),
            "Candidate selected"
        );
        self.metrics.record_selection(category, candidate.name());

        Selection {
            candidate,
            budget_reverted,
        }
    }
}

/// Best candidate in `pool` for `priority`, earliest wins ties
fn rank<'a>(pool: &[&'a ModelCandidate], priority: Priority) -> Option<&'a ModelCandidate> {
    let better = |challenger: &ModelCandidate, incumbent: &ModelCandidate| match priority {
        Priority::Quality => challenger.est_quality() > incumbent.est_quality(),
        Priority::Latency => challenger.est_latency_ms() < incumbent.est_latency_ms(),
        Priority::Cost => challenger.value_score() > incumbent.value_score(),
    };

    pool.iter().copied().fold(None, |best, candidate| match best {
        Some(incumbent) if !better(candidate, incumbent) => Some(incumbent),
        _ => Some(candidate),
    })
}
