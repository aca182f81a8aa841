use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub industry: Option<String>,
    /// Free-form label such as "entry-level", "mid-level", "senior".
    pub experience_level: Option<String>,
    pub job_type: Option<String>,
    pub skills: Vec<String>,
    pub status: String,
    pub is_archived: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl JobRow {
    /// A posting is listable when it is open, not archived, and not expired.
    /// Postings without an expiry never expire.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == "open"
            && !self.is_archived
            && self.expires_at.map_or(true, |expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job() -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            description: String::new(),
            industry: None,
            experience_level: None,
            job_type: None,
            skills: vec![],
            status: "open".to_string(),
            is_archived: false,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_unarchived_unexpired_is_listable() {
        assert!(job().is_open(Utc::now()));
    }

    #[test]
    fn test_closed_or_archived_is_not_listable() {
        let now = Utc::now();

        let mut closed = job();
        closed.status = "closed".to_string();
        assert!(!closed.is_open(now));

        let mut archived = job();
        archived.is_archived = true;
        assert!(!archived.is_open(now));
    }

    #[test]
    fn test_expiry_is_compared_against_now() {
        let now = Utc::now();

        let mut expired = job();
        expired.expires_at = Some(now - Duration::hours(1));
        assert!(!expired.is_open(now));

        let mut future = job();
        future.expires_at = Some(now + Duration::hours(1));
        assert!(future.is_open(now));
    }
}
