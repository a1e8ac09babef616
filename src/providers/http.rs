//! HTTP plumbing shared by the provider adapters

use super::{ProviderError, ProviderKind};
use std::time::{Duration, Instant};

/// Build the pooled HTTP client used by one adapter
pub(crate) fn build_client(provider: ProviderKind) -> crate::error::AppResult<reqwest::Client> {
    reqwest::Client::builder().build().map_err(|e| {
        crate::error::AppError::Config(format!(
            "Failed to create HTTP client for provider {}: {}",
            provider, e
        ))
    })
}

/// Send a prepared request and decode the JSON body
///
/// Non-2xx answers become [`ProviderError::Status`] with the raw body attached.
/// The whole exchange is bounded by `timeout_seconds`.
pub(crate) async fn send_json(
    request: reqwest::RequestBuilder,
    provider: ProviderKind,
    model: &str,
    timeout_seconds: u64,
) -> Result<serde_json::Value, ProviderError> {
    let exchange = async {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider,
                model: model.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider,
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport {
                provider,
                model: model.to_string(),
                message: format!("failed to read response body: {}", e),
            })?;

        serde_json::from_slice::<serde_json::Value>(&bytes).map_err(|e| {
            ProviderError::InvalidResponse {
                provider,
                model: model.to_string(),
                details: format!("body is not valid JSON: {}", e),
            }
        })
    };

    match tokio::time::timeout(Duration::from_secs(timeout_seconds), exchange).await {
        Ok(result) => result,
        Err(_elapsed) => Err(ProviderError::Timeout {
            provider,
            model: model.to_string(),
            timeout_seconds,
        }),
    }
}

/// Milliseconds since `start`, saturating at `u64::MAX`
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Read a non-negative integer at `pointer`, defaulting to zero
pub(crate) fn token_count(payload: &serde_json::Value, pointer: &str) -> u64 {
    payload
        .pointer(pointer)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}
