pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::admission::handlers as admission;
use crate::matching::handlers as matching;
use crate::notify::handlers as notify;
use crate::recommend::handlers as recommend;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Application intake and review
        .route(
            "/api/v1/applications",
            post(admission::handle_submit_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(admission::handle_advance_status),
        )
        // Recommendations
        .route(
            "/api/v1/profiles/:subject_id/recommendations",
            get(recommend::handle_recommendations),
        )
        .route(
            "/api/v1/profiles/:subject_id/refresh",
            post(matching::handle_profile_refresh),
        )
        // Cache administration
        .route(
            "/api/v1/cache/profiles/:subject_id",
            delete(matching::handle_invalidate_profile_cache),
        )
        .route(
            "/api/v1/cache/jobs/:job_id",
            delete(matching::handle_invalidate_job_cache),
        )
        // Notifications
        .route(
            "/api/v1/users/:user_id/notifications",
            get(notify::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(notify::handle_mark_read),
        )
        .with_state(state)
}
