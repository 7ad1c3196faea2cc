//! Progress endpoint
//!
//! GET /progress/{user_defined_id}/

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /progress response
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub user_defined_id: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// Report the completion percentage of a job
pub async fn get_progress(
    State(state): State<AppState>,
    Path(user_defined_id): Path<String>,
) -> ApiResult<Json<ProgressResponse>> {
    let total = state.orchestrator.config().target_set.len();

    let progress = crate::services::job_progress(&state.db, &user_defined_id, total)
        .await?
        .ok_or_else(|| ApiError::JobNotFound(user_defined_id.clone()))?;

    tracing::debug!(
        job_key = %user_defined_id,
        collected = progress.collected,
        total,
        "Progress query"
    );

    Ok(Json(ProgressResponse {
        user_defined_id,
        status: progress.status(),
    }))
}

/// Build progress routes
pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/progress/:user_defined_id", get(get_progress))
        .route("/progress/:user_defined_id/", get(get_progress))
}
