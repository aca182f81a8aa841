//! Matching core: normalization, feature building, scoring, and the
//! cache-first orchestration engines call into.

pub mod handlers;
pub mod job_features;
pub mod normalizer;
pub mod profile_features;
pub mod scoring;

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::info;
use uuid::Uuid;

use crate::cache::{self, compute_with_cache, FeatureCache, FEATURE_TTL};
use crate::errors::AppError;
use crate::matching::job_features::{build_job_features, JobFeatures};
use crate::matching::profile_features::{build_profile_features, ProfileFeatures};
use crate::matching::scoring::{compute_match, MatchResult};
use crate::stores::{JobStore, ProfileStore};

/// Cache-first access to feature records and match results. Admission and
/// recommendation both go through here, so a score computed for one is a
/// cache hit for the other.
pub struct Matcher {
    profiles: Arc<dyn ProfileStore>,
    jobs: Arc<dyn JobStore>,
    cache: Arc<dyn FeatureCache>,
}

impl Matcher {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        jobs: Arc<dyn JobStore>,
        cache: Arc<dyn FeatureCache>,
    ) -> Self {
        Self {
            profiles,
            jobs,
            cache,
        }
    }

    pub async fn profile_features(&self, subject_id: Uuid) -> Result<ProfileFeatures, AppError> {
        let key = cache::profile_features_key(subject_id);
        compute_with_cache(self.cache.as_ref(), &key, FEATURE_TTL, || async move {
            let profile = self.profiles.get_profile(subject_id).await?;
            Ok(build_profile_features(&profile, Utc::now().year()))
        })
        .await
    }

    pub async fn job_features(&self, job_id: Uuid) -> Result<JobFeatures, AppError> {
        let key = cache::job_features_key(job_id);
        compute_with_cache(self.cache.as_ref(), &key, FEATURE_TTL, || async move {
            let job = self.jobs.get_job(job_id).await?;
            Ok(build_job_features(&job))
        })
        .await
    }

    /// Cache-first MatchResult for a (subject, job) pair.
    pub async fn match_result(
        &self,
        subject_id: Uuid,
        job_id: Uuid,
    ) -> Result<MatchResult, AppError> {
        let profile = self.profile_features(subject_id).await?;
        self.score_against(&profile, job_id).await
    }

    /// Scores already-built profile features against one job. The
    /// recommendation loop uses this so the profile is only built once per
    /// batch; the job features and the pair result stay cache-first.
    pub async fn score_against(
        &self,
        profile: &ProfileFeatures,
        job_id: Uuid,
    ) -> Result<MatchResult, AppError> {
        let key = cache::match_result_key(profile.subject_id, job_id);
        compute_with_cache(self.cache.as_ref(), &key, FEATURE_TTL, || async move {
            let job = self.job_features(job_id).await?;
            Ok(compute_match(profile, &job))
        })
        .await
    }

    /// Drops the subject's cached profile features so the next build reads
    /// from source. Cached (subject, job) results keep their TTL.
    pub async fn invalidate_profile(&self, subject_id: Uuid) -> Result<(), AppError> {
        self.cache
            .delete(&cache::profile_features_key(subject_id))
            .await?;
        info!("Invalidated cached profile features for {subject_id}");
        Ok(())
    }

    /// Drops a posting's cached features; for the posting-edit path.
    pub async fn invalidate_job(&self, job_id: Uuid) -> Result<(), AppError> {
        self.cache.delete(&cache::job_features_key(job_id)).await?;
        info!("Invalidated cached job features for {job_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        sample_job, sample_profile, MemoryCache, MemoryJobStore, MemoryProfileStore,
    };

    fn matcher(
        profiles: Arc<MemoryProfileStore>,
        jobs: Arc<MemoryJobStore>,
        cache: Arc<MemoryCache>,
    ) -> Matcher {
        Matcher::new(profiles, jobs, cache)
    }

    #[tokio::test]
    async fn test_profile_features_hit_the_store_once_until_invalidated() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let cache = Arc::new(MemoryCache::new());
        let subject_id = profiles.put(sample_profile());

        let m = matcher(profiles.clone(), jobs, cache);

        m.profile_features(subject_id).await.unwrap();
        m.profile_features(subject_id).await.unwrap();
        assert_eq!(profiles.fetch_count(), 1);

        m.invalidate_profile(subject_id).await.unwrap();
        m.profile_features(subject_id).await.unwrap();
        assert_eq!(profiles.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_subject_is_not_found_and_never_cached() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let cache = Arc::new(MemoryCache::new());
        let m = matcher(profiles, jobs, cache.clone());

        let missing = Uuid::new_v4();
        let err = m.profile_features(missing).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(cache.raw(&cache::profile_features_key(missing)).is_none());
    }

    #[tokio::test]
    async fn test_match_results_are_cached_per_pair() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let cache = Arc::new(MemoryCache::new());
        let subject_id = profiles.put(sample_profile());
        let job_id = jobs.put(sample_job());

        let m = matcher(profiles, jobs.clone(), cache.clone());

        let first = m.match_result(subject_id, job_id).await.unwrap();
        assert!(cache
            .raw(&cache::match_result_key(subject_id, job_id))
            .is_some());

        // A second call is served from the pair cache: no further job fetch.
        let fetches_before = jobs.fetch_count();
        let second = m.match_result(subject_id, job_id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(jobs.fetch_count(), fetches_before);
    }

    #[tokio::test]
    async fn test_profile_invalidation_leaves_pair_results_to_their_ttl() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let cache = Arc::new(MemoryCache::new());
        let subject_id = profiles.put(sample_profile());
        let job_id = jobs.put(sample_job());

        let m = matcher(profiles, jobs, cache.clone());
        m.match_result(subject_id, job_id).await.unwrap();

        m.invalidate_profile(subject_id).await.unwrap();

        assert!(cache.raw(&cache::profile_features_key(subject_id)).is_none());
        // Documented staleness window: pair results age out via TTL only.
        assert!(cache
            .raw(&cache::match_result_key(subject_id, job_id))
            .is_some());
    }

    #[tokio::test]
    async fn test_job_invalidation_drops_only_the_job_key() {
        let profiles = Arc::new(MemoryProfileStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let cache = Arc::new(MemoryCache::new());
        let subject_id = profiles.put(sample_profile());
        let job_id = jobs.put(sample_job());

        let m = matcher(profiles, jobs, cache.clone());
        m.match_result(subject_id, job_id).await.unwrap();

        m.invalidate_job(job_id).await.unwrap();

        assert!(cache.raw(&cache::job_features_key(job_id)).is_none());
        assert!(cache.raw(&cache::profile_features_key(subject_id)).is_some());
    }
}
