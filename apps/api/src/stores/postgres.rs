//! Postgres implementations of the storage seams. Every query is wrapped in
//! the shared timeout bound so a slow database surfaces as `Timeout` instead
//! of a hung request or worker.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::{bounded, AppError};
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::job::JobRow;
use crate::models::notification::NotificationRow;
use crate::models::profile::{Profile, ProfileRow};
use crate::stores::{
    ApplicationStore, JobStore, NewApplication, NewNotification, NotificationStore, ProfileStore,
};

pub struct PgProfileStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgProfileStore {
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile(&self, subject_id: Uuid) -> Result<Profile, AppError> {
        let pool = self.pool.clone();
        let row = bounded("profile fetch", self.op_timeout, async move {
            let row = sqlx::query_as::<_, ProfileRow>(
                r#"
                SELECT subject_id, skills, education, experience, bio, resume_text
                FROM profiles
                WHERE subject_id = $1
                "#,
            )
            .bind(subject_id)
            .fetch_optional(&pool)
            .await?;
            Ok(row)
        })
        .await?;

        row.map(Profile::from)
            .ok_or_else(|| AppError::NotFound(format!("Profile {subject_id} not found")))
    }
}

pub struct PgJobStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgJobStore {
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn get_job(&self, job_id: Uuid) -> Result<JobRow, AppError> {
        let pool = self.pool.clone();
        let row = bounded("job fetch", self.op_timeout, async move {
            let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
                .bind(job_id)
                .fetch_optional(&pool)
                .await?;
            Ok(row)
        })
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
    }

    async fn list_open_jobs(&self) -> Result<Vec<JobRow>, AppError> {
        let pool = self.pool.clone();
        bounded("open jobs fetch", self.op_timeout, async move {
            let rows = sqlx::query_as::<_, JobRow>(
                r#"
                SELECT * FROM jobs
                WHERE status = 'open'
                  AND is_archived = FALSE
                  AND (expires_at IS NULL OR expires_at > NOW())
                ORDER BY created_at DESC
                "#,
            )
            .fetch_all(&pool)
            .await?;
            Ok(rows)
        })
        .await
    }
}

pub struct PgApplicationStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn insert(&self, new: NewApplication) -> Result<Option<ApplicationRow>, AppError> {
        let pool = self.pool.clone();
        bounded("application insert", self.op_timeout, async move {
            // A conflicting (job_id, subject_id) pair comes back as no row,
            // not as an error.
            let row = sqlx::query_as::<_, ApplicationRow>(
                r#"
                INSERT INTO applications (id, job_id, subject_id, resume_url, match_score, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (job_id, subject_id) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(new.job_id)
            .bind(new.subject_id)
            .bind(&new.resume_url)
            .bind(new.match_score)
            .bind(new.status)
            .fetch_optional(&pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn find_by_pair(
        &self,
        job_id: Uuid,
        subject_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError> {
        let pool = self.pool.clone();
        bounded("application lookup", self.op_timeout, async move {
            let row = sqlx::query_as::<_, ApplicationRow>(
                "SELECT * FROM applications WHERE job_id = $1 AND subject_id = $2",
            )
            .bind(job_id)
            .bind(subject_id)
            .fetch_optional(&pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn get(&self, id: Uuid) -> Result<ApplicationRow, AppError> {
        let pool = self.pool.clone();
        let row = bounded("application fetch", self.op_timeout, async move {
            let row =
                sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&pool)
                    .await?;
            Ok(row)
        })
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<ApplicationRow, AppError> {
        let pool = self.pool.clone();
        let row = bounded("application status update", self.op_timeout, async move {
            let row = sqlx::query_as::<_, ApplicationRow>(
                r#"
                UPDATE applications
                SET status = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(status)
            .fetch_optional(&pool)
            .await?;
            Ok(row)
        })
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
    }
}

pub struct PgNotificationStore {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, new: NewNotification) -> Result<NotificationRow, AppError> {
        let pool = self.pool.clone();
        bounded("notification insert", self.op_timeout, async move {
            let row = sqlx::query_as::<_, NotificationRow>(
                r#"
                INSERT INTO notifications (id, user_id, message, payload)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(new.user_id)
            .bind(&new.message)
            .bind(&new.payload)
            .fetch_one(&pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<NotificationRow>, AppError> {
        let pool = self.pool.clone();
        bounded("notification list", self.op_timeout, async move {
            let rows = sqlx::query_as::<_, NotificationRow>(
                "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&pool)
            .await?;
            Ok(rows)
        })
        .await
    }

    async fn mark_read(&self, id: Uuid) -> Result<(), AppError> {
        let pool = self.pool.clone();
        let updated = bounded("notification mark read", self.op_timeout, async move {
            let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
                .bind(id)
                .execute(&pool)
                .await?;
            Ok(result.rows_affected())
        })
        .await?;

        if updated == 0 {
            return Err(AppError::NotFound(format!("Notification {id} not found")));
        }
        Ok(())
    }
}
