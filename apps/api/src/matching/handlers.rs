//! Cache administration and profile refresh endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::admission::handlers::EnqueuedResponse;
use crate::errors::AppError;
use crate::queue::{NewTask, TaskKind};
use crate::state::AppState;

/// POST /api/v1/profiles/:subject_id/refresh
///
/// Enqueues a profile-update task: invalidate cached features, then rebuild
/// the subject's recommendations.
pub async fn handle_profile_refresh(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<(StatusCode, Json<EnqueuedResponse>), AppError> {
    let payload = json!({ "subject_id": subject_id });
    let task_id = state
        .queue
        .enqueue(NewTask::new(TaskKind::ProcessProfileUpdate, payload))
        .await?;
    Ok((StatusCode::ACCEPTED, Json(EnqueuedResponse { task_id })))
}

/// DELETE /api/v1/cache/profiles/:subject_id
pub async fn handle_invalidate_profile_cache(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.matcher.invalidate_profile(subject_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/cache/jobs/:job_id
///
/// For the posting-edit path: the posting's features rebuild on next use,
/// while cached pair scores age out on their TTL.
pub async fn handle_invalidate_job_cache(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.matcher.invalidate_job(job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
