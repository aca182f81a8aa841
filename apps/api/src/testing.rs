//! In-memory doubles for the storage, cache, and channel seams, plus shared
//! fixtures. Everything here goes through the same constructors production
//! wiring uses, so engine tests exercise real orchestration code.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::cache::FeatureCache;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::job::JobRow;
use crate::models::notification::NotificationRow;
use crate::models::profile::{EducationEntry, ExperienceEntry, Profile};
use crate::notify::RealtimeChannel;
use crate::stores::{
    ApplicationStore, JobStore, NewApplication, NewNotification, NotificationStore, ProfileStore,
};

// Fixtures. The pair below scores 48 against each other; `mismatched_job`
// scores 30 against the same profile, under the bar.

pub fn sample_profile() -> Profile {
    Profile {
        subject_id: Uuid::new_v4(),
        skills: vec!["Python".to_string(), "SQL".to_string()],
        education: vec![EducationEntry {
            degree: Some("Bachelor of Science".to_string()),
            institution: Some("State University".to_string()),
            year: Some(2018),
        }],
        experience: vec![ExperienceEntry {
            position: Some("Data Engineer".to_string()),
            company: Some("Initech".to_string()),
            description: Some("Python SQL pipelines".to_string()),
            start_year: Some(2018.0),
            end_year: Some(2023.0),
        }],
        bio: Some("Data engineer".to_string()),
        resume_text: Some("Python SQL Django".to_string()),
    }
}

pub fn sample_job() -> JobRow {
    JobRow {
        id: Uuid::new_v4(),
        title: "Python Engineer".to_string(),
        description: "Python and SQL pipelines, Django services. Bachelor degree required."
            .to_string(),
        industry: Some("Software".to_string()),
        experience_level: Some("mid-level".to_string()),
        job_type: Some("full-time".to_string()),
        skills: vec!["Python".to_string(), "SQL".to_string()],
        status: "open".to_string(),
        is_archived: false,
        expires_at: None,
        created_at: Utc::now(),
    }
}

/// Nothing in `sample_profile` overlaps this posting's text.
pub fn mismatched_job() -> JobRow {
    JobRow {
        id: Uuid::new_v4(),
        title: "Forklift Operator".to_string(),
        description: "Warehouse forklift loading and pallet handling.".to_string(),
        industry: Some("Logistics".to_string()),
        experience_level: Some("senior".to_string()),
        job_type: Some("full-time".to_string()),
        skills: vec!["Forklift".to_string()],
        status: "open".to_string(),
        is_archived: false,
        expires_at: None,
        created_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
    last_ttl: Mutex<Option<Duration>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn last_ttl(&self) -> Option<Duration> {
        *self.last_ttl.lock().unwrap()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FeatureCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("cache read refused".to_string()));
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("cache write refused".to_string()));
        }
        *self.last_ttl.lock().unwrap() = Some(ttl);
        self.put_raw(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    fetches: AtomicUsize,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, profile: Profile) -> Uuid {
        let id = profile.subject_id;
        self.profiles.lock().unwrap().insert(id, profile);
        id
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, subject_id: Uuid) -> Result<Profile, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .lock()
            .unwrap()
            .get(&subject_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No profile for subject {subject_id}")))
    }
}

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, JobRow>>,
    // listed by list_open_jobs but unknown to get_job
    ghosts: Mutex<Vec<JobRow>>,
    fetches: AtomicUsize,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, job: JobRow) -> Uuid {
        let id = job.id;
        self.jobs.lock().unwrap().insert(id, job);
        id
    }

    pub fn put_ghost(&self, job: JobRow) {
        self.ghosts.lock().unwrap().push(job);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get_job(&self, job_id: Uuid) -> Result<JobRow, AppError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.jobs
            .lock()
            .unwrap()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No job {job_id}")))
    }

    /// Returns every stored row unfiltered; engines re-check openness
    /// themselves, which is what the tests rely on.
    async fn list_open_jobs(&self) -> Result<Vec<JobRow>, AppError> {
        let mut rows: Vec<JobRow> = self.jobs.lock().unwrap().values().cloned().collect();
        rows.extend(self.ghosts.lock().unwrap().iter().cloned());
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryApplicationStore {
    rows: Mutex<Vec<ApplicationRow>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<ApplicationRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn insert(&self, new: NewApplication) -> Result<Option<ApplicationRow>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|row| row.job_id == new.job_id && row.subject_id == new.subject_id)
        {
            return Ok(None);
        }
        let now = Utc::now();
        let row = ApplicationRow {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            subject_id: new.subject_id,
            resume_url: new.resume_url,
            match_score: new.match_score,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(Some(row))
    }

    async fn find_by_pair(
        &self,
        job_id: Uuid,
        subject_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.job_id == job_id && row.subject_id == subject_id)
            .cloned())
    }

    async fn get(&self, id: Uuid) -> Result<ApplicationRow, AppError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No application {id}")))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<ApplicationRow, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No application {id}")))?;
        row.status = status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

#[derive(Default)]
pub struct MemoryNotificationStore {
    rows: Mutex<Vec<NotificationRow>>,
    fail_inserts: AtomicBool,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<NotificationRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn insert(&self, new: NewNotification) -> Result<NotificationRow, AppError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("notification insert refused".to_string()));
        }
        let row = NotificationRow {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            message: new.message,
            payload: new.payload,
            is_read: false,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<NotificationRow>, AppError> {
        let mut rows: Vec<NotificationRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn mark_read(&self, id: Uuid) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No notification {id}")))?;
        row.is_read = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryChannel {
    published: Mutex<Vec<(Uuid, String, Value)>>,
    fail: AtomicBool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(Uuid, String, Value)> {
        self.published.lock().unwrap().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RealtimeChannel for MemoryChannel {
    async fn publish(&self, user_id: Uuid, event: &str, data: &Value) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Dependency("publish refused".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((user_id, event.to_string(), data.clone()));
        Ok(())
    }
}
