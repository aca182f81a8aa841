use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an application. The admission decision writes `pending` or
/// `unqualified`; every later move is employer-driven and must be legal under
/// `can_transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Unqualified,
    Shortlisted,
    Scheduled,
    Interviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Unqualified => "unqualified",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Scheduled => "scheduled",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Unqualified
                | ApplicationStatus::Accepted
                | ApplicationStatus::Rejected
        )
    }

    pub fn can_transition(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Shortlisted | Rejected)
                | (Shortlisted, Scheduled | Rejected)
                | (Scheduled, Interviewed | Rejected)
                | (Interviewed, Accepted | Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub subject_id: Uuid,
    pub resume_url: Option<String>,
    pub match_score: i32,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
