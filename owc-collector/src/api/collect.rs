//! Collection endpoint
//!
//! POST /collect/ with `{"user_defined_id": "<key>"}`. Checks run in order and
//! the first failure wins: JSON parse, key present, key unused. All of them
//! happen before any upstream request or write.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::WeatherJob;
use crate::AppState;

/// Extract a non-empty `user_defined_id` from a parsed body
fn job_key(request: &Value) -> Option<&str> {
    request
        .get("user_defined_id")
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
}

/// POST /collect/
///
/// Creates the job and streams the collection as it runs.
pub async fn start_collection(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let request: Value = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidJson)?;
    let job_key = job_key(&request).ok_or(ApiError::MissingJobKey)?.to_string();

    if crate::db::jobs::job_exists(&state.db, &job_key).await? {
        tracing::info!(job_key = %job_key, "Rejected collection: job key already exists");
        return Err(ApiError::JobKeyExists);
    }

    let job = WeatherJob::new(job_key.clone(), owc_common::time::now());
    match crate::db::jobs::create_job(&state.db, &job).await {
        Ok(()) => {}
        // Lost a race with a concurrent request for the same key
        Err(owc_common::Error::Conflict(_)) => return Err(ApiError::JobKeyExists),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        job_key = %job_key,
        request_datetime = %job.request_datetime,
        "Collection job created"
    );

    let fragments = state.orchestrator.run(job_key, job.request_datetime);

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(fragments),
    )
        .into_response())
}

/// Any method other than POST on the collection route
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Build collection routes
pub fn collect_routes() -> Router<AppState> {
    Router::new()
        .route("/collect", post(start_collection).fallback(method_not_allowed))
        .route("/collect/", post(start_collection).fallback(method_not_allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_key_extraction() {
        assert_eq!(job_key(&json!({"user_defined_id": "abc"})), Some("abc"));
        assert_eq!(job_key(&json!({"user_defined_id": ""})), None);
        assert_eq!(job_key(&json!({"user_defined_id": 42})), None);
        assert_eq!(job_key(&json!({})), None);
        assert_eq!(job_key(&json!(["user_defined_id"])), None);
    }
}
