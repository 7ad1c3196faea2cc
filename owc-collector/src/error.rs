//! Error types for owc-collector
//!
//! `ApiError` is what HTTP handlers return; its bodies match the public
//! contract of the collection and progress endpoints. `CollectError` covers a
//! running collection.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::weather_client::UpstreamError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body is not JSON (400)
    #[error("Invalid JSON")]
    InvalidJson,

    /// `user_defined_id` missing or empty (400)
    #[error("User ID not provided")]
    MissingJobKey,

    /// A job with this key already exists (400)
    #[error("User ID already exists")]
    JobKeyExists,

    /// Collection route called with a method other than POST (400)
    #[error("Method not allowed.")]
    MethodNotAllowed,

    /// Unknown job key (404)
    #[error("User ID not found.")]
    JobNotFound(String),

    /// Storage failure before streaming started (500)
    #[error("Storage error: {0}")]
    Storage(#[from] owc_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ApiError::InvalidJson => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "message": message }),
            ),
            ApiError::MissingJobKey | ApiError::JobKeyExists | ApiError::MethodNotAllowed => {
                (StatusCode::BAD_REQUEST, json!({ "Error": message }))
            }
            ApiError::JobNotFound(key) => (
                StatusCode::NOT_FOUND,
                json!({ "user_defined_id": key, "Status": message }),
            ),
            ApiError::Storage(ref err) => {
                tracing::error!(error = %err, "Request failed on storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "Error": message }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised while collecting a job
#[derive(Debug, Error)]
pub enum CollectError {
    /// Upstream payload lacks a required field
    #[error("Malformed upstream response: missing {0}")]
    MalformedUpstreamResponse(&'static str),

    /// One upstream request failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Loading or saving job state failed; aborts the run
    #[error("Storage error: {0}")]
    Storage(#[from] owc_common::Error),
}
