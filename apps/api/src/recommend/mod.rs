//! Recommendation: ranks open postings for a subject by match score. One
//! posting failing to score never sinks the whole ranking.

pub mod handlers;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::scoring::QUALIFY_THRESHOLD;
use crate::matching::Matcher;
use crate::stores::JobStore;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct RecommendedJob {
    pub job_id: Uuid,
    pub title: String,
    pub industry: Option<String>,
    pub score: i32,
    pub posted_at: DateTime<Utc>,
}

pub struct RecommendationEngine {
    matcher: Arc<Matcher>,
    jobs: Arc<dyn JobStore>,
}

impl RecommendationEngine {
    pub fn new(matcher: Arc<Matcher>, jobs: Arc<dyn JobStore>) -> Self {
        Self { matcher, jobs }
    }

    /// Top `top_n` qualifying postings for the subject, best score first,
    /// newer posting first on ties. Closed, archived, and expired postings
    /// never appear regardless of how well they match.
    pub async fn find_matching_jobs(
        &self,
        subject_id: Uuid,
        top_n: usize,
    ) -> Result<Vec<RecommendedJob>, AppError> {
        let profile = self.matcher.profile_features(subject_id).await?;
        let candidates = self.jobs.list_open_jobs().await?;
        let now = Utc::now();

        let mut matches = Vec::new();
        for job in candidates {
            if !job.is_open(now) {
                continue;
            }
            match self.matcher.score_against(&profile, job.id).await {
                Ok(result) if result.score >= QUALIFY_THRESHOLD => {
                    matches.push(RecommendedJob {
                        job_id: job.id,
                        title: job.title,
                        industry: job.industry,
                        score: result.score,
                        posted_at: job.created_at,
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Skipping job {} while ranking for {subject_id}: {e}", job.id);
                }
            }
        }

        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.posted_at.cmp(&a.posted_at))
        });
        matches.truncate(top_n);
        Ok(matches)
    }
}
