//! Model candidates and their fallback targets

use crate::providers::ProviderKind;
use serde::{Deserialize, Serialize};

/// Model to try once when a candidate fails
///
/// Carries its own provider so a fallback may cross backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackTarget {
    name: String,
    provider: ProviderKind,
}

impl FallbackTarget {
    pub fn new(name: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }
}

/// One invocable model configuration
///
/// Fields are private; catalogs validate candidates once at load time and
/// nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"), from = "RawCandidate")]
pub struct ModelCandidate {
    name: String,
    provider: ProviderKind,
    est_quality: f64,
    est_cost_per_1k_tokens: f64,
    est_latency_ms: u64,
    fallback: Option<FallbackTarget>,
}

impl ModelCandidate {
    pub fn new(
        name: impl Into<String>,
        provider: ProviderKind,
        est_quality: f64,
        est_cost_per_1k_tokens: f64,
        est_latency_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            est_quality,
            est_cost_per_1k_tokens,
            est_latency_ms,
            fallback: None,
        }
    }

    /// Set the fallback model, served by `provider`
    pub fn with_fallback(mut self, name: impl Into<String>, provider: ProviderKind) -> Self {
        self.fallback = Some(FallbackTarget::new(name, provider));
        self
    }

    /// Model identifier as understood by its provider
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Higher is better
    pub fn est_quality(&self) -> f64 {
        self.est_quality
    }

    pub fn est_cost_per_1k_tokens(&self) -> f64 {
        self.est_cost_per_1k_tokens
    }

    pub fn est_latency_ms(&self) -> u64 {
        self.est_latency_ms
    }

    pub fn fallback(&self) -> Option<&FallbackTarget> {
        self.fallback.as_ref()
    }

    /// Quality per unit cost, used by the `cost` priority
    pub fn value_score(&self) -> f64 {
        self.est_quality / self.est_cost_per_1k_tokens
    }
}

/// Config form of a candidate
///
/// `fallback` may be a bare model name (same provider as the candidate) or a
/// `{ name, provider }` table.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    name: String,
    provider: ProviderKind,
    est_quality: f64,
    est_cost_per_1k_tokens: f64,
    est_latency_ms: u64,
    #[serde(default)]
    fallback: Option<RawFallback>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFallback {
    Name(String),
    Target {
        name: String,
        #[serde(default)]
        provider: Option<ProviderKind>,
    },
}

impl From<RawCandidate> for ModelCandidate {
    fn from(raw: RawCandidate) -> Self {
        let fallback = raw.fallback.map(|fallback| match fallback {
            RawFallback::Name(name) => FallbackTarget::new(name, raw.provider),
            RawFallback::Target { name, provider } => {
                FallbackTarget::new(name, provider.unwrap_or(raw.provider))
            }
        });

        Self {
            name: raw.name,
            provider: raw.provider,
            est_quality: raw.est_quality,
            est_cost_per_1k_tokens: raw.est_cost_per_1k_tokens,
            est_latency_ms: raw.est_latency_ms,
            fallback,
        }
    }
}
