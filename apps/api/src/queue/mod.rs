#![allow(dead_code)]

//! Durable background task queue on Postgres. Claims use `FOR UPDATE SKIP
//! LOCKED` so concurrent workers never double-process a task, and every
//! claimed task carries a lease so a crashed worker's work is reclaimed.

pub mod worker;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{bounded, AppError};

pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// How long a claimed task may run before other workers treat it as
/// abandoned and reclaim it.
const CLAIM_LEASE: Duration = Duration::from_secs(60);

const MAX_RETRY_DELAY_MS: u64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    ProcessApplication,
    ProcessProfileUpdate,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::ProcessApplication => "process-application",
            TaskKind::ProcessProfileUpdate => "process-profile-update",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "process-application" => Some(TaskKind::ProcessApplication),
            "process-profile-update" => Some(TaskKind::ProcessProfileUpdate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    DeadLetter,
}

/// Payload for `process-application`. Fields stay optional so a malformed
/// enqueue surfaces as a controlled failure when the task runs, not as a
/// decode panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessApplicationPayload {
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    #[serde(default)]
    pub job_id: Option<Uuid>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

/// Payload for `process-profile-update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessProfileUpdatePayload {
    pub subject_id: Uuid,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub kind: String,
    pub payload: Value,
    pub status: TaskStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub backoff_base_ms: i64,
    pub run_at: DateTime<Utc>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRow {
    /// A payload that does not decode is a permanent defect of the task, so
    /// the error is non-retryable.
    pub fn decode_payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            AppError::Validation(format!("Task {} payload does not decode: {e}", self.id))
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub kind: TaskKind,
    pub payload: Value,
    pub max_attempts: i32,
    pub backoff_base: Duration,
}

impl NewTask {
    pub fn new(kind: TaskKind, payload: Value) -> Self {
        Self {
            kind,
            payload,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

/// The enqueue seam handlers depend on. Claiming and completion are worker
/// internals and stay on the concrete Postgres queue.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: NewTask) -> Result<Uuid, AppError>;
}

/// Delay before attempt `attempts + 1`: base doubled per prior attempt,
/// capped at an hour.
pub fn retry_delay(attempts: i32, base: Duration) -> Duration {
    let exponent = attempts.saturating_sub(1).max(0) as u32;
    let factor = 2u64.saturating_pow(exponent);
    let millis = (base.as_millis() as u64).saturating_mul(factor);
    Duration::from_millis(millis.min(MAX_RETRY_DELAY_MS))
}

#[derive(Debug, PartialEq, Eq)]
enum FailureAction {
    Retry(Duration),
    Park,
}

/// Retry while the error is transient and attempts remain; park otherwise.
/// The attempt counter already includes the attempt that just failed.
fn failure_action(task: &TaskRow, error: &AppError) -> FailureAction {
    if task.attempts >= task.max_attempts || !error.is_retryable() {
        FailureAction::Park
    } else {
        FailureAction::Retry(retry_delay(
            task.attempts,
            Duration::from_millis(task.backoff_base_ms as u64),
        ))
    }
}

pub struct PgTaskQueue {
    pool: PgPool,
    op_timeout: Duration,
}

impl PgTaskQueue {
    pub fn new(pool: PgPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Claims up to `batch` runnable tasks for `worker_id`. A task is
    /// runnable when it is pending and due, or running with an expired
    /// lease. The attempt counter is bumped at claim time so the counter
    /// always reflects the attempt in flight.
    pub async fn claim(&self, batch: i64, worker_id: &str) -> Result<Vec<TaskRow>, AppError> {
        let pool = self.pool.clone();
        let worker_id = worker_id.to_string();
        bounded("task claim", self.op_timeout, async move {
            let rows = sqlx::query_as::<_, TaskRow>(
                r#"
                WITH runnable AS (
                    SELECT id FROM tasks
                    WHERE (status = 'pending' AND run_at <= NOW())
                       OR (status = 'running' AND lease_expires_at < NOW())
                    ORDER BY run_at
                    LIMIT $1
                    FOR UPDATE SKIP LOCKED
                )
                UPDATE tasks t
                SET status = 'running',
                    attempts = t.attempts + 1,
                    locked_by = $2,
                    lease_expires_at = NOW() + make_interval(secs => $3),
                    updated_at = NOW()
                FROM runnable
                WHERE t.id = runnable.id
                RETURNING t.*
                "#,
            )
            .bind(batch)
            .bind(&worker_id)
            .bind(CLAIM_LEASE.as_secs_f64())
            .fetch_all(&pool)
            .await?;
            Ok(rows)
        })
        .await
    }

    pub async fn mark_succeeded(&self, task_id: Uuid) -> Result<(), AppError> {
        let pool = self.pool.clone();
        bounded("task success", self.op_timeout, async move {
            sqlx::query(
                r#"
                UPDATE tasks
                SET status = 'succeeded', lease_expires_at = NULL, locked_by = NULL,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(task_id)
            .execute(&pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// Reschedules a failed task with backoff, or parks it in the dead
    /// letter state when attempts are exhausted or the error is permanent.
    pub async fn mark_failed(&self, task: &TaskRow, error: &AppError) -> Result<(), AppError> {
        match failure_action(task, error) {
            FailureAction::Park => {
                warn!(
                    "Task {} ({}) dead-lettered after {} attempt(s): {error}",
                    task.id, task.kind, task.attempts
                );
                self.park(task.id, error).await
            }
            FailureAction::Retry(delay) => {
                warn!(
                    "Task {} ({}) failed attempt {} of {}, retrying in {}ms: {error}",
                    task.id,
                    task.kind,
                    task.attempts,
                    task.max_attempts,
                    delay.as_millis()
                );
                self.reschedule(task.id, delay, error).await
            }
        }
    }

    async fn reschedule(
        &self,
        task_id: Uuid,
        delay: Duration,
        error: &AppError,
    ) -> Result<(), AppError> {
        let pool = self.pool.clone();
        let last_error = error.to_string();
        bounded("task reschedule", self.op_timeout, async move {
            sqlx::query(
                r#"
                UPDATE tasks
                SET status = 'pending', run_at = NOW() + make_interval(secs => $2),
                    lease_expires_at = NULL, locked_by = NULL, last_error = $3,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(task_id)
            .bind(delay.as_secs_f64())
            .bind(&last_error)
            .execute(&pool)
            .await?;
            Ok(())
        })
        .await
    }

    async fn park(&self, task_id: Uuid, error: &AppError) -> Result<(), AppError> {
        let pool = self.pool.clone();
        let last_error = error.to_string();
        bounded("task dead-letter", self.op_timeout, async move {
            sqlx::query(
                r#"
                UPDATE tasks
                SET status = 'dead_letter', lease_expires_at = NULL, locked_by = NULL,
                    last_error = $2, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(task_id)
            .bind(&last_error)
            .execute(&pool)
            .await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn enqueue(&self, task: NewTask) -> Result<Uuid, AppError> {
        let pool = self.pool.clone();
        bounded("task enqueue", self.op_timeout, async move {
            let id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO tasks (id, kind, payload, status, attempts, max_attempts, backoff_base_ms, run_at)
                VALUES ($1, $2, $3, 'pending', 0, $4, $5, NOW())
                "#,
            )
            .bind(id)
            .bind(task.kind.as_str())
            .bind(&task.payload)
            .bind(task.max_attempts)
            .bind(task.backoff_base.as_millis() as i64)
            .execute(&pool)
            .await?;
            Ok(id)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_after_attempt(attempts: i32) -> TaskRow {
        TaskRow {
            id: Uuid::new_v4(),
            kind: "process-application".to_string(),
            payload: json!({}),
            status: TaskStatus::Running,
            attempts,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: 1000,
            run_at: Utc::now(),
            lease_expires_at: None,
            locked_by: Some("worker-test".to_string()),
            last_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_retry_delay_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        assert_eq!(retry_delay(1, base), Duration::from_secs(1));
        assert_eq!(retry_delay(2, base), Duration::from_secs(2));
        assert_eq!(retry_delay(3, base), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_delay_is_capped_at_an_hour() {
        let base = Duration::from_secs(1);
        assert_eq!(retry_delay(40, base), Duration::from_millis(MAX_RETRY_DELAY_MS));
    }

    #[test]
    fn test_transient_failures_retry_on_the_backoff_schedule() {
        let timeout = AppError::Timeout("job fetch".into());
        assert_eq!(
            failure_action(&task_after_attempt(1), &timeout),
            FailureAction::Retry(Duration::from_secs(1))
        );
        assert_eq!(
            failure_action(&task_after_attempt(2), &timeout),
            FailureAction::Retry(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_third_failure_is_parked_not_retried() {
        let timeout = AppError::Timeout("job fetch".into());
        assert_eq!(
            failure_action(&task_after_attempt(DEFAULT_MAX_ATTEMPTS), &timeout),
            FailureAction::Park
        );
    }

    #[test]
    fn test_permanent_errors_park_on_the_first_failure() {
        let invalid = AppError::Validation("missing job_id".into());
        assert_eq!(
            failure_action(&task_after_attempt(1), &invalid),
            FailureAction::Park
        );
    }

    #[test]
    fn test_task_kind_round_trips_through_its_wire_name() {
        for kind in [TaskKind::ProcessApplication, TaskKind::ProcessProfileUpdate] {
            assert_eq!(TaskKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TaskKind::parse("send-newsletter"), None);
    }

    #[test]
    fn test_payload_decode_failure_is_a_validation_error() {
        let mut task = task_after_attempt(1);
        task.kind = "process-profile-update".to_string();
        task.payload = json!({"subject_id": "not-a-uuid"});

        let err = task.decode_payload::<ProcessProfileUpdatePayload>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_application_payload_tolerates_missing_fields() {
        let mut task = task_after_attempt(1);
        task.payload = json!({"resume_url": "https://cdn.example.com/cv.pdf"});

        let payload: ProcessApplicationPayload = task.decode_payload().unwrap();
        assert!(payload.subject_id.is_none());
        assert!(payload.job_id.is_none());
        assert_eq!(payload.resume_url.as_deref(), Some("https://cdn.example.com/cv.pdf"));
    }
}
