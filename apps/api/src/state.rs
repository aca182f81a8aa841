use std::sync::Arc;

use crate::admission::AdmissionEngine;
use crate::matching::Matcher;
use crate::queue::TaskQueue;
use crate::recommend::RecommendationEngine;
use crate::stores::NotificationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<Matcher>,
    pub admission: Arc<AdmissionEngine>,
    pub recommender: Arc<RecommendationEngine>,
    pub queue: Arc<dyn TaskQueue>,
    pub notifications: Arc<dyn NotificationStore>,
}
