//! HTTP intake for applications. Submission is asynchronous: the handler
//! validates shape, enqueues a task, and answers 202 with the task id.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::queue::{NewTask, TaskKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitApplicationRequest {
    pub subject_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub resume_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnqueuedResponse {
    pub task_id: Uuid,
}

/// POST /api/v1/applications
pub async fn handle_submit_application(
    State(state): State<AppState>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<(StatusCode, Json<EnqueuedResponse>), AppError> {
    if request.subject_id.is_none() || request.job_id.is_none() {
        return Err(AppError::Validation(
            "subject_id and job_id are both required".to_string(),
        ));
    }

    let payload = json!({
        "subject_id": request.subject_id,
        "job_id": request.job_id,
        "resume_url": request.resume_url,
    });
    let task_id = state
        .queue
        .enqueue(NewTask::new(TaskKind::ProcessApplication, payload))
        .await?;

    Ok((StatusCode::ACCEPTED, Json(EnqueuedResponse { task_id })))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: ApplicationStatus,
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_advance_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdvanceStatusRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let updated = state.admission.advance_status(id, request.status).await?;
    Ok(Json(updated))
}
