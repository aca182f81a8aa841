//! Background worker: polls the task queue, runs claimed tasks
//! concurrently, and settles each one as succeeded, rescheduled, or
//! dead-lettered.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::admission::{AdmissionEngine, SubmitApplication};
use crate::config::Config;
use crate::errors::AppError;
use crate::matching::Matcher;
use crate::queue::{
    PgTaskQueue, ProcessApplicationPayload, ProcessProfileUpdatePayload, TaskKind, TaskRow,
};
use crate::recommend::{RecommendationEngine, DEFAULT_TOP_N};

pub struct WorkerConfig {
    pub batch_size: i64,
    pub poll_interval: Duration,
    pub worker_id: String,
}

impl WorkerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.worker_batch_size,
            poll_interval: config.worker_poll_interval,
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

pub struct TaskWorker {
    queue: Arc<PgTaskQueue>,
    admission: Arc<AdmissionEngine>,
    recommender: Arc<RecommendationEngine>,
    matcher: Arc<Matcher>,
    config: WorkerConfig,
}

impl TaskWorker {
    pub fn new(
        queue: Arc<PgTaskQueue>,
        admission: Arc<AdmissionEngine>,
        recommender: Arc<RecommendationEngine>,
        matcher: Arc<Matcher>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            admission,
            recommender,
            matcher,
            config,
        }
    }

    /// Runs until the token is cancelled. Claimed tasks from one poll run
    /// concurrently; the next poll starts after all of them settle.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Task worker {} started", self.config.worker_id);
        let mut poll = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = poll.tick() => {}
            }
            match self.queue.claim(self.config.batch_size, &self.config.worker_id).await {
                Ok(tasks) => {
                    if tasks.is_empty() {
                        continue;
                    }
                    debug!("Claimed {} task(s)", tasks.len());
                    join_all(tasks.into_iter().map(|task| self.process(task))).await;
                }
                Err(e) => warn!("Task claim failed: {e}"),
            }
        }
        info!("Task worker {} stopped", self.config.worker_id);
    }

    async fn process(&self, task: TaskRow) {
        let task_id = task.id;
        debug!(task_id = %task_id, kind = %task.kind, attempt = task.attempts, "Running task");
        match self.handle(&task).await {
            Ok(()) => {
                if let Err(e) = self.queue.mark_succeeded(task_id).await {
                    error!("Task {task_id} finished but could not be settled: {e}");
                }
            }
            Err(e) => {
                if let Err(mark_err) = self.queue.mark_failed(&task, &e).await {
                    error!("Task {task_id} failed and could not be settled: {mark_err}");
                }
            }
        }
    }

    /// An `Ok` here means the task itself completed. A submission that was
    /// turned away (unqualified, duplicate, invalid) is still a completed
    /// task; only infrastructure errors bubble out for retry handling.
    async fn handle(&self, task: &TaskRow) -> Result<(), AppError> {
        match TaskKind::parse(&task.kind) {
            Some(TaskKind::ProcessApplication) => {
                let payload: ProcessApplicationPayload = task.decode_payload()?;
                let request = SubmitApplication {
                    subject_id: payload.subject_id,
                    job_id: payload.job_id,
                    resume_url: payload.resume_url,
                };
                let outcome = self.admission.submit_application(request).await?;
                info!(
                    task_id = %task.id,
                    success = outcome.success,
                    score = ?outcome.score,
                    "Processed application task"
                );
                Ok(())
            }
            Some(TaskKind::ProcessProfileUpdate) => {
                let payload: ProcessProfileUpdatePayload = task.decode_payload()?;
                self.matcher.invalidate_profile(payload.subject_id).await?;
                let matches = self
                    .recommender
                    .find_matching_jobs(payload.subject_id, DEFAULT_TOP_N)
                    .await?;
                info!(
                    task_id = %task.id,
                    subject_id = %payload.subject_id,
                    count = matches.len(),
                    "Rebuilt recommendations after profile update"
                );
                Ok(())
            }
            None => Err(AppError::Validation(format!(
                "Unknown task kind {}",
                task.kind
            ))),
        }
    }
}
