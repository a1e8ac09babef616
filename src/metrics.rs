//! Prometheus metrics collection for taskroute
//!
//! Tracks:
//! - Requests by task category and priority
//! - Which candidate the selector picked
//! - Latency budget reversions
//! - Provider attempts by outcome, fallbacks, and execution latency
//! - Classifications that resolved to "Other" because of an error
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.
//! All label values come from closed enums or the catalog, so cardinality is
//! bounded by configuration.

use crate::classifier::TaskCategory;
use crate::models::Priority;
use crate::providers::{ProviderError, ProviderKind};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Outcome label for a provider attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure(&'static str),
}

impl AttemptOutcome {
    pub fn from_result<T>(result: &Result<T, ProviderError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) => Self::Failure(e.kind_label()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure(kind) => kind,
        }
    }
}

/// Metrics collector for taskroute
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    selections_total: IntCounterVec,
    budget_reversions: IntCounterVec,
    provider_attempts: IntCounterVec,
    fallbacks_total: IntCounterVec,
    execution_duration: HistogramVec,
    classification_fallbacks: IntCounterVec,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a fresh Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 5 categories x 3 priorities
        let requests_total = IntCounterVec::new(
            Opts::new(
                "taskroute_requests_total",
                "Total execute requests by task category and priority",
            ),
            &["category", "priority"],
        )?;

        // Cardinality: bounded by catalog size
        let selections_total = IntCounterVec::new(
            Opts::new(
                "taskroute_selections_total",
                "Candidates chosen by the selector, by category and model",
            ),
            &["category", "model"],
        )?;

        let budget_reversions = IntCounterVec::new(
            Opts::new(
                "taskroute_budget_reversions_total",
                "Selections where no candidate met the latency budget and the full list was used",
            ),
            &["category"],
        )?;

        // outcome: success, transport, timeout, status, invalid_response, unavailable
        let provider_attempts = IntCounterVec::new(
            Opts::new(
                "taskroute_provider_attempts_total",
                "Provider invocations by provider and outcome",
            ),
            &["provider", "outcome"],
        )?;

        let fallbacks_total = IntCounterVec::new(
            Opts::new(
                "taskroute_fallbacks_total",
                "Fallback invocations after a primary candidate failed, by fallback provider",
            ),
            &["provider"],
        )?;

        let execution_duration = HistogramVec::new(
            HistogramOpts::new(
                "taskroute_execution_duration_ms",
                "Provider call latency in milliseconds, successful calls only",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 30000.0,
            ]),
            &["provider"],
        )?;

        // reason: the ClassifierError kind
        let classification_fallbacks = IntCounterVec::new(
            Opts::new(
                "taskroute_classification_fallbacks_total",
                "Prompts resolved to \"Other\" because classification failed or was inconclusive",
            ),
            &["reason"],
        )?;

        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "taskroute_metrics_recording_failures_total",
                "Metrics recording operation failures by operation",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(selections_total.clone()))?;
        registry.register(Box::new(budget_reversions.clone()))?;
        registry.register(Box::new(provider_attempts.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(execution_duration.clone()))?;
        registry.register(Box::new(classification_fallbacks.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            selections_total,
            budget_reversions,
            provider_attempts,
            fallbacks_total,
            execution_duration,
            classification_fallbacks,
            metrics_recording_failures,
        })
    }

    /// Record an execute request once its category is known
    ///
    /// # Errors
    ///
    /// Returns an error if the label set does not match the metric.
    pub fn record_request(
        &self,
        category: TaskCategory,
        priority: Priority,
    ) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[category.metric_label(), priority.as_str()])?
            .inc();
        Ok(())
    }

    pub fn record_selection(&self, category: TaskCategory, model: &str) {
        self.selections_total
            .with_label_values(&[category.metric_label(), model])
            .inc();
    }

    pub fn budget_reversion(&self, category: TaskCategory) {
        self.budget_reversions
            .with_label_values(&[category.metric_label()])
            .inc();
    }

    pub fn record_attempt(&self, provider: ProviderKind, outcome: AttemptOutcome) {
        self.provider_attempts
            .with_label_values(&[provider.as_str(), outcome.as_str()])
            .inc();
    }

    pub fn fallback_invoked(&self, provider: ProviderKind) {
        self.fallbacks_total
            .with_label_values(&[provider.as_str()])
            .inc();
    }

    /// Record provider call latency
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite, or negative, or if
    /// the metric is not registered. Non-finite values would poison every
    /// percentile of the histogram.
    pub fn record_execution_duration(
        &self,
        provider: ProviderKind,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative, got: {}",
                duration_ms
            )));
        }

        self.execution_duration
            .get_metric_with_label_values(&[provider.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    pub fn classification_fallback(&self, reason: &str) {
        self.classification_fallbacks
            .with_label_values(&[reason])
            .inc();
    }

    pub fn metrics_recording_failure(&self, operation: &str) {
        self.metrics_recording_failures
            .with_label_values(&[operation])
            .inc();
    }

    /// Sum a counter family across every label combination
    fn counter_total(&self, name: &str) -> u64 {
        self.registry
            .gather()
            .iter()
            .find(|mf| mf.name() == name)
            .map(|mf| {
                mf.get_metric()
                    .iter()
                    .map(|m| m.counter.value.unwrap_or(0.0) as u64)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn budget_reversions_count(&self) -> u64 {
        self.counter_total("taskroute_budget_reversions_total")
    }

    pub fn fallbacks_count(&self) -> u64 {
        self.counter_total("taskroute_fallbacks_total")
    }

    pub fn classification_fallbacks_count(&self) -> u64 {
        self.counter_total("taskroute_classification_fallbacks_total")
    }

    pub fn metrics_recording_failures_count(&self) -> u64 {
        self.counter_total("taskroute_metrics_recording_failures_total")
    }

    /// Gather all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let metric_count = metric_families.len();

        tracing::debug!(
            metric_family_count = metric_count,
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    metric_family_count = metric_count,
                    "Prometheus text encoder failed"
                );
                prometheus::Error::Msg(format!(
                    "Failed to encode {} metric families: {}",
                    metric_count, e
                ))
            })?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Prometheus encoder produced invalid UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new_registers_every_family() {
        let metrics = Metrics::new().expect("Failed to create metrics");

        metrics
            .record_request(TaskCategory::CodeGeneration, Priority::Quality)
            .unwrap();
        metrics.record_selection(TaskCategory::CodeGeneration, "gpt-5-pro");
        metrics.budget_reversion(TaskCategory::CodeGeneration);
        metrics.record_attempt(ProviderKind::OpenAi, AttemptOutcome::Success);
        metrics.fallback_invoked(ProviderKind::Google);
        metrics
            .record_execution_duration(ProviderKind::OpenAi, 120.0)
            .unwrap();
        metrics.classification_fallback("inconclusive");
        metrics.metrics_recording_failure("record_request");

        let output = metrics.gather().unwrap();
        for name in [
            "taskroute_requests_total",
            "taskroute_selections_total",
            "taskroute_budget_reversions_total",
            "taskroute_provider_attempts_total",
            "taskroute_fallbacks_total",
            "taskroute_execution_duration_ms",
            "taskroute_classification_fallbacks_total",
            "taskroute_metrics_recording_failures_total",
        ] {
            assert!(output.contains(name), "missing metric family {}", name);
        }
    }

    #[test]
    fn test_request_labels_use_metric_friendly_category() {
        let metrics = Metrics::new().unwrap();
        metrics
            .record_request(TaskCategory::TextSummarization, Priority::Cost)
            .unwrap();

        let output = metrics.gather().unwrap();
        assert!(output.contains(
            r#"taskroute_requests_total{category="text_summarization",priority="cost"} 1"#
        ));
    }

    #[test]
    fn test_attempt_outcome_labels() {
        let metrics = Metrics::new().unwrap();
        let failed: Result<(), ProviderError> = Err(ProviderError::Timeout {
            provider: ProviderKind::Google,
            model: "gemini-2.5-pro".to_string(),
            timeout_seconds: 5,
        });
        metrics.record_attempt(ProviderKind::Google, AttemptOutcome::from_result(&failed));

        let output = metrics.gather().unwrap();
        assert!(output.contains(
            r#"taskroute_provider_attempts_total{outcome="timeout",provider="google"} 1"#
        ));
    }

    #[test]
    fn test_execution_duration_rejects_invalid_values() {
        let metrics = Metrics::new().unwrap();
        assert!(
            metrics
                .record_execution_duration(ProviderKind::OpenAi, f64::NAN)
                .is_err()
        );
        assert!(
            metrics
                .record_execution_duration(ProviderKind::OpenAi, f64::INFINITY)
                .is_err()
        );
        assert!(
            metrics
                .record_execution_duration(ProviderKind::OpenAi, -1.0)
                .is_err()
        );
        assert!(
            metrics
                .record_execution_duration(ProviderKind::OpenAi, 0.0)
                .is_ok()
        );
    }

    #[test]
    fn test_counter_totals_sum_across_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.fallback_invoked(ProviderKind::OpenAi);
        metrics.fallback_invoked(ProviderKind::Google);
        metrics.fallback_invoked(ProviderKind::Google);
        metrics.budget_reversion(TaskCategory::Other);
        metrics.classification_fallback("provider");

        assert_eq!(metrics.fallbacks_count(), 3);
        assert_eq!(metrics.budget_reversions_count(), 1);
        assert_eq!(metrics.classification_fallbacks_count(), 1);
        assert_eq!(metrics.metrics_recording_failures_count(), 0);
    }
}
