//! Recommendation read endpoint.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::recommend::{RecommendedJob, DEFAULT_TOP_N};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub limit: Option<usize>,
}

/// GET /api/v1/profiles/:subject_id/recommendations?limit=N
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
    Query(params): Query<RecommendationParams>,
) -> Result<Json<Vec<RecommendedJob>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_TOP_N);
    if limit == 0 || limit > 100 {
        return Err(AppError::Validation(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    let matches = state.recommender.find_matching_jobs(subject_id, limit).await?;
    Ok(Json(matches))
}
