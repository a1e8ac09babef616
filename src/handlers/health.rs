//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// "operational", or "degraded" once any metrics recording has failed
    pub metrics_status: &'static str,
}

/// Health check handler
///
/// Always returns 200 OK; provider reachability is not checked.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let metrics_status = if state.metrics().metrics_recording_failures_count() > 0 {
        "degraded"
    } else {
        "operational"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            metrics_status,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::str::FromStr;
    use std::sync::Arc;

    fn create_test_state() -> AppState {
        let config = Config::from_str(
            r#"
[server]
host = "127.0.0.1"
port = 3000

[classifier]
strategy = "keyword"
"#,
        )
        .expect("should parse test config");
        AppState::new(Arc::new(config)).expect("should create AppState")
    }

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let (status, Json(body)) = handler(State(create_test_state())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert_eq!(body.metrics_status, "operational");
    }

    #[tokio::test]
    async fn test_health_handler_shows_degraded_after_recording_failure() {
        let state = create_test_state();
        state.metrics().metrics_recording_failure("record_request");

        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert_eq!(body.metrics_status, "degraded");
    }
}
