//! JSON extractor with field-level validation errors
//!
//! Wraps Axum's `Json` extractor. Syntax errors become `400 {"error": "Invalid
//! JSON"}`. A well-formed object is deserialized into the request's raw form
//! and handed to [`ValidateRequest::validate`], whose field errors become
//! `400 {"error": "Invalid request body", "details": [...]}`.

use crate::error::{AppError, FieldError};
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::{Deserialize, de::DeserializeOwned};

/// Longest accepted prompt, in characters
pub const MAX_PROMPT_LENGTH: usize = 100_000;

/// Request bodies that check their own fields
pub trait ValidateRequest: Sized {
    /// Wire shape of the body, before any field is checked
    type Raw: DeserializeOwned;

    /// Build the request from its raw form, reporting every bad field
    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldError>>;
}

/// A raw field that either has the expected type or holds something else
///
/// Lets one bad field be reported by name instead of failing the whole body.
/// `null` deserializes as an absent `Option<FieldValue<T>>`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    Valid(T),
    Invalid(#[allow(dead_code)] serde_json::Value),
}

/// JSON body extractor producing [`AppError::Validation`] on failure
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: ValidateRequest,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::JsonSyntaxError(_) => {
                    AppError::invalid_request("Invalid JSON", Vec::new())
                }
                JsonRejection::MissingJsonContentType(_) => AppError::invalid_request(
                    "Content-Type must be application/json",
                    Vec::new(),
                ),
                other => AppError::invalid_request(other.body_text(), Vec::new()),
            })?;

        parse_body::<T>(body)
            .map(ValidJson)
            .map_err(|details| AppError::invalid_request("Invalid request body", details))
    }
}

/// Deserialize an object body into `T::Raw`, then validate it
pub(crate) fn parse_body<T: ValidateRequest>(
    body: serde_json::Value,
) -> Result<T, Vec<FieldError>> {
    if !body.is_object() {
        return Err(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )]);
    }
    let raw = serde_json::from_value::<T::Raw>(body)
        .map_err(|e| vec![FieldError::new("body", e.to_string())])?;
    T::validate(raw)
}

/// Validate the `prompt` field shared by every route
pub(crate) fn prompt_field(
    prompt: Option<FieldValue<String>>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match prompt {
        None => {
            errors.push(FieldError::new("prompt", "Prompt is required"));
            None
        }
        Some(FieldValue::Valid(prompt)) if prompt.trim().is_empty() => {
            errors.push(FieldError::new("prompt", "Prompt cannot be empty"));
            None
        }
        Some(FieldValue::Valid(prompt)) => {
            let char_count = prompt.chars().count();
            if char_count > MAX_PROMPT_LENGTH {
                errors.push(FieldError::new(
                    "prompt",
                    format!(
                        "Prompt exceeds maximum length of {} characters (got {})",
                        MAX_PROMPT_LENGTH, char_count
                    ),
                ));
                return None;
            }
            Some(prompt)
        }
        Some(FieldValue::Invalid(_)) => {
            errors.push(FieldError::new("prompt", "Prompt must be a string"));
            None
        }
    }
}
