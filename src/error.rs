//! Error types for taskroute
//!
//! All errors implement `IntoResponse` for Axum handlers.

use crate::executor::ExecutionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to callers when execution fails after fallback.
///
/// Diagnostics (candidate name, provider status, raw error body) are logged
/// but not exposed verbatim.
pub const GENERIC_EXECUTION_ERROR: &str = "An internal server error occurred.";

/// Validation failure for a single request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    /// Malformed or missing request input. Never retried.
    #[error("Invalid request: {message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    /// Primary and fallback (if any) both failed
    #[error(transparent)]
    ExecutionFailed(#[from] ExecutionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a validation error with per-field detail
    pub fn invalid_request(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    /// Returns true for errors raised while loading or validating configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConfigFileRead { .. }
                | Self::ConfigParseFailed { .. }
                | Self::ConfigValidationFailed { .. }
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": message, "details": details }),
            ),
            Self::Config(msg) | Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": self.to_string() }),
            ),
            Self::ExecutionFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": GENERIC_EXECUTION_ERROR }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
