//! Notification read endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::notification::NotificationRow;
use crate::state::AppState;

/// GET /api/v1/users/:user_id/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    let rows = state.notifications.list_for_user(user_id).await?;
    Ok(Json(rows))
}

/// POST /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.notifications.mark_read(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
