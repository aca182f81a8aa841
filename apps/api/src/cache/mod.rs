//! Feature cache: Redis-backed key-value store for serialized feature
//! records and match results, plus the cache-aside strategy every builder
//! shares. The cache is advisory; losing it only costs recomputation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{bounded, AppError};

/// Feature records and match results all age out after a day.
pub const FEATURE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn profile_features_key(subject_id: Uuid) -> String {
    format!("features:profile:{subject_id}")
}

pub fn job_features_key(job_id: Uuid) -> String {
    format!("features:job:{job_id}")
}

pub fn match_result_key(subject_id: Uuid, job_id: Uuid) -> String {
    format!("match:{subject_id}:{job_id}")
}

/// String-valued cache seam. Values are JSON; typed encode/decode lives in
/// `compute_with_cache` so the trait stays object-safe.
#[async_trait]
pub trait FeatureCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct RedisFeatureCache {
    conn: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisFeatureCache {
    /// Establishes the multiplexed connection once; per-op handles are cheap
    /// clones of it.
    pub async fn connect(client: &redis::Client, op_timeout: Duration) -> Result<Self, AppError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn, op_timeout })
    }
}

#[async_trait]
impl FeatureCache for RedisFeatureCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.conn.clone();
        let key = key.to_string();
        bounded("cache get", self.op_timeout, async move {
            let value: Option<String> = conn.get(&key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let key = key.to_string();
        let value = value.to_string();
        let seconds = ttl.as_secs();
        bounded("cache set", self.op_timeout, async move {
            conn.set_ex::<_, _, ()>(&key, &value, seconds).await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let key = key.to_string();
        bounded("cache delete", self.op_timeout, async move {
            conn.del::<_, ()>(&key).await?;
            Ok(())
        })
        .await
    }
}

/// Cache-aside, shared by the profile builder, the job builder, and the score
/// path: try the cache, fall back to `compute`, write the result back under
/// `ttl` before returning it. Cache failures degrade to a miss and are
/// logged; only `compute` itself can fail the call.
pub async fn compute_with_cache<T, F, Fut>(
    cache: &dyn FeatureCache,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, AppError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => warn!("Dropping undecodable cache entry {key}: {e}"),
        },
        Ok(None) => {}
        Err(e) => warn!("Cache read for {key} failed, computing from source: {e}"),
    }

    let value = compute().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = cache.set(key, &raw, ttl).await {
                warn!("Cache write for {key} failed: {e}");
            }
        }
        Err(e) => warn!("Could not serialize value for cache key {key}: {e}"),
    }

    Ok(value)
}
