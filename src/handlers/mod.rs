//! HTTP request handlers for the taskroute API

use crate::classifier::{self, Classifier};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::executor::Executor;
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::models::{CandidateSelector, Catalog};
use crate::providers::ProviderRegistry;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod classify;
pub mod execute;
pub mod extractor;
pub mod health;
pub mod metrics;
pub mod models;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    classifier: Arc<dyn Classifier>,
    selector: Arc<CandidateSelector>,
    executor: Arc<Executor>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create the state from configuration, wiring the HTTP providers and the
    /// configured classifier
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is invalid, an HTTP client cannot be
    /// built, or Prometheus metrics fail to register.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let catalog = config.catalog()?;
        let providers = ProviderRegistry::from_config(&config.providers)?;
        let classifier = classifier::from_config(&config.classifier)?;
        let metrics = Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize Prometheus metrics: {}", e))
        })?;

        Self::from_parts(config, catalog, providers, classifier, Arc::new(metrics))
    }

    /// Assemble the state from pre-built parts
    ///
    /// Every provider referenced by the catalog, fallbacks included, must have
    /// a registered adapter.
    pub fn from_parts(
        config: Arc<Config>,
        catalog: Catalog,
        providers: ProviderRegistry,
        classifier: Arc<dyn Classifier>,
        metrics: Arc<Metrics>,
    ) -> AppResult<Self> {
        let missing: Vec<_> = catalog
            .providers()
            .into_iter()
            .filter(|kind| !providers.contains(*kind))
            .map(|kind| kind.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "catalog references providers with no adapter: {}",
                missing.join(", ")
            )));
        }

        tracing::info!(
            providers = ?providers.kinds(),
            classifier = classifier.name(),
            custom_catalog = config.has_custom_catalog(),
            "Application state initialized"
        );

        let catalog = Arc::new(catalog);
        let selector = Arc::new(CandidateSelector::new(catalog, metrics.clone()));
        let executor = Arc::new(Executor::new(Arc::new(providers), metrics.clone()));

        Ok(Self {
            config,
            classifier,
            selector,
            executor,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn selector(&self) -> &CandidateSelector {
        &self.selector
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the HTTP router with every endpoint and the shared middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/execute", post(execute::handler))
        .route("/api/classify", post(classify::handler))
        .route("/models", get(models::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}
