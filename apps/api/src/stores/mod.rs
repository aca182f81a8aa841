//! Storage seams for the pipeline's collaborators. Engines depend on these
//! traits only; Postgres implementations live in `postgres`, in-memory
//! doubles in the test support module.

pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::job::JobRow;
use crate::models::notification::NotificationRow;
use crate::models::profile::Profile;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the stored profile; `NotFound` if the subject has none.
    async fn get_profile(&self, subject_id: Uuid) -> Result<Profile, AppError>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetches a posting regardless of its state; `NotFound` if absent.
    async fn get_job(&self, job_id: Uuid) -> Result<JobRow, AppError>;
    /// All postings currently worth recommending: open, not archived, not
    /// expired.
    async fn list_open_jobs(&self) -> Result<Vec<JobRow>, AppError>;
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub subject_id: Uuid,
    pub resume_url: Option<String>,
    pub match_score: i32,
    pub status: ApplicationStatus,
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Inserts a new application. Returns `None` when the (job, subject)
    /// uniqueness constraint absorbed a duplicate instead of inserting.
    async fn insert(&self, new: NewApplication) -> Result<Option<ApplicationRow>, AppError>;

    async fn find_by_pair(
        &self,
        job_id: Uuid,
        subject_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError>;

    async fn get(&self, id: Uuid) -> Result<ApplicationRow, AppError>;

    /// Writes a new status. Legality against the state machine is the
    /// caller's responsibility; this only persists.
    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<ApplicationRow, AppError>;
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub message: String,
    pub payload: Option<Value>,
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, new: NewNotification) -> Result<NotificationRow, AppError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<NotificationRow>, AppError>;
    async fn mark_read(&self, id: Uuid) -> Result<(), AppError>;
}
