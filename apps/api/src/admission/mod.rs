//! Admission: scores a submission, persists it as pending or unqualified,
//! and tells the applicant what happened. Submissions that cannot proceed
//! come back as structured outcomes, not errors; errors are reserved for
//! infrastructure failures.

pub mod handlers;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::job_features::required_years_for_label;
use crate::matching::scoring::ScoreBreakdown;
use crate::matching::Matcher;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::job::JobRow;
use crate::notify::NotificationDispatcher;
use crate::stores::{ApplicationStore, JobStore, NewApplication};

#[derive(Debug, Clone, Default)]
pub struct SubmitApplication {
    pub subject_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub resume_url: Option<String>,
}

/// What one submission attempt produced. `success` is false for missing
/// fields, duplicates, and unqualified scores alike; `message` says which,
/// and `score`/`breakdown` are present whenever scoring ran.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub success: bool,
    pub application_id: Option<Uuid>,
    pub score: Option<i32>,
    pub breakdown: Option<ScoreBreakdown>,
    pub message: String,
}

impl SubmissionOutcome {
    fn turned_away(message: impl Into<String>) -> Self {
        Self {
            success: false,
            application_id: None,
            score: None,
            breakdown: None,
            message: message.into(),
        }
    }
}

pub struct AdmissionEngine {
    matcher: Arc<Matcher>,
    jobs: Arc<dyn JobStore>,
    applications: Arc<dyn ApplicationStore>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl AdmissionEngine {
    pub fn new(
        matcher: Arc<Matcher>,
        jobs: Arc<dyn JobStore>,
        applications: Arc<dyn ApplicationStore>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            matcher,
            jobs,
            applications,
            dispatcher,
        }
    }

    pub async fn submit_application(
        &self,
        request: SubmitApplication,
    ) -> Result<SubmissionOutcome, AppError> {
        let (Some(subject_id), Some(job_id)) = (request.subject_id, request.job_id) else {
            return Ok(SubmissionOutcome::turned_away(
                "subject_id and job_id are both required",
            ));
        };

        if let Some(existing) = self.applications.find_by_pair(job_id, subject_id).await? {
            info!(
                "Subject {subject_id} already applied to job {job_id} (application {})",
                existing.id
            );
            return Ok(SubmissionOutcome {
                application_id: Some(existing.id),
                ..SubmissionOutcome::turned_away("An application for this job already exists")
            });
        }

        let job = self.jobs.get_job(job_id).await?;
        let result = self.matcher.match_result(subject_id, job_id).await?;

        let status = if result.qualified {
            ApplicationStatus::Pending
        } else {
            ApplicationStatus::Unqualified
        };
        let inserted = self
            .applications
            .insert(NewApplication {
                job_id,
                subject_id,
                resume_url: request.resume_url,
                match_score: result.score,
                status,
            })
            .await?;

        // A concurrent submission can slip in between the pre-check and the
        // insert; the unique constraint absorbs it.
        let Some(application) = inserted else {
            return Ok(SubmissionOutcome::turned_away(
                "An application for this job already exists",
            ));
        };

        if result.qualified {
            info!(
                "Application {} admitted for job {job_id} with score {}",
                application.id, result.score
            );
            let message = format!(
                "Your application for \"{}\" was received and is under review.",
                job.title
            );
            self.notify_best_effort(
                subject_id,
                &message,
                json!({
                    "type": "application_submitted",
                    "application_id": application.id,
                    "job_id": job_id,
                    "score": result.score,
                }),
            )
            .await;
            Ok(SubmissionOutcome {
                success: true,
                application_id: Some(application.id),
                score: Some(result.score),
                breakdown: Some(result.breakdown),
                message: "Application submitted".to_string(),
            })
        } else {
            info!(
                "Application {} recorded as unqualified for job {job_id} with score {}",
                application.id, result.score
            );
            let message = rejection_message(&job, result.score);
            self.notify_best_effort(
                subject_id,
                &message,
                json!({
                    "type": "application_unqualified",
                    "application_id": application.id,
                    "job_id": job_id,
                    "score": result.score,
                }),
            )
            .await;
            Ok(SubmissionOutcome {
                success: false,
                application_id: Some(application.id),
                score: Some(result.score),
                breakdown: Some(result.breakdown),
                message: format!(
                    "Application does not meet the qualification bar (score {})",
                    result.score
                ),
            })
        }
    }

    /// Moves an application along the review state machine. Illegal moves
    /// are validation errors and change nothing.
    pub async fn advance_status(
        &self,
        application_id: Uuid,
        next: ApplicationStatus,
    ) -> Result<ApplicationRow, AppError> {
        let current = self.applications.get(application_id).await?;
        if current.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "Application {application_id} is closed ({})",
                current.status.as_str()
            )));
        }
        if !current.status.can_transition(next) {
            return Err(AppError::Validation(format!(
                "Cannot move application {application_id} from {} to {}",
                current.status.as_str(),
                next.as_str()
            )));
        }

        let updated = self.applications.update_status(application_id, next).await?;
        info!(
            "Application {application_id} moved from {} to {}",
            current.status.as_str(),
            next.as_str()
        );

        if let Some(message) = self.status_message(&updated, next).await {
            self.notify_best_effort(
                updated.subject_id,
                &message,
                json!({
                    "type": "application_status",
                    "application_id": updated.id,
                    "job_id": updated.job_id,
                    "status": next,
                }),
            )
            .await;
        }

        Ok(updated)
    }

    /// Wording for the transitions an applicant sees. Scheduling and
    /// interview bookkeeping moves stay silent.
    async fn status_message(
        &self,
        application: &ApplicationRow,
        next: ApplicationStatus,
    ) -> Option<String> {
        if !matches!(
            next,
            ApplicationStatus::Shortlisted
                | ApplicationStatus::Accepted
                | ApplicationStatus::Rejected
        ) {
            return None;
        }
        let title = self
            .jobs
            .get_job(application.job_id)
            .await
            .ok()
            .map(|job| job.title);
        let title = title.as_deref().unwrap_or("the position");
        match next {
            ApplicationStatus::Shortlisted => {
                Some(format!("You have been shortlisted for \"{title}\"."))
            }
            ApplicationStatus::Accepted => Some(format!(
                "Congratulations, your application for \"{title}\" was accepted."
            )),
            ApplicationStatus::Rejected => Some(format!(
                "Your application for \"{title}\" was not successful this time."
            )),
            _ => None,
        }
    }

    async fn notify_best_effort(&self, user_id: Uuid, message: &str, payload: Value) {
        if let Err(e) = self.dispatcher.notify(user_id, message, Some(payload)).await {
            warn!("Notification to {user_id} was dropped: {e}");
        }
    }
}

/// Rejection wording carries the posting's expectations so the applicant
/// knows what fell short.
fn rejection_message(job: &JobRow, score: i32) -> String {
    let required_years = required_years_for_label(job.experience_level.as_deref());
    let industry = job.industry.as_deref().unwrap_or("the posting's field");
    format!(
        "Your application for \"{}\" did not qualify (score {score}). The posting expects around {required_years:.0} years of experience in {industry}.",
        job.title
    )
}
