mod admission;
mod cache;
mod config;
mod db;
mod errors;
mod matching;
mod models;
mod notify;
mod queue;
mod recommend;
mod routes;
mod state;
mod stores;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::admission::AdmissionEngine;
use crate::cache::RedisFeatureCache;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::matching::Matcher;
use crate::notify::{NotificationDispatcher, RedisRealtimeChannel};
use crate::queue::worker::{TaskWorker, WorkerConfig};
use crate::queue::PgTaskQueue;
use crate::recommend::RecommendationEngine;
use crate::routes::build_router;
use crate::state::AppState;
use crate::stores::postgres::{
    PgApplicationStore, PgJobStore, PgNotificationStore, PgProfileStore,
};
use crate::stores::NotificationStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails with context on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let op_timeout = config.dependency_timeout;
    let cache = Arc::new(RedisFeatureCache::connect(&redis, op_timeout).await?);
    let channel = Arc::new(RedisRealtimeChannel::connect(&redis, op_timeout).await?);
    info!("Redis connections established");

    // Stores
    let profiles = Arc::new(PgProfileStore::new(db.clone(), op_timeout));
    let jobs = Arc::new(PgJobStore::new(db.clone(), op_timeout));
    let applications = Arc::new(PgApplicationStore::new(db.clone(), op_timeout));
    let notifications: Arc<dyn NotificationStore> =
        Arc::new(PgNotificationStore::new(db.clone(), op_timeout));

    // Engines
    let dispatcher = Arc::new(NotificationDispatcher::new(notifications.clone(), channel));
    let matcher = Arc::new(Matcher::new(profiles, jobs.clone(), cache));
    let admission = Arc::new(AdmissionEngine::new(
        matcher.clone(),
        jobs.clone(),
        applications,
        dispatcher,
    ));
    let recommender = Arc::new(RecommendationEngine::new(matcher.clone(), jobs));

    // Background worker
    let queue = Arc::new(PgTaskQueue::new(db.clone(), op_timeout));
    let shutdown = CancellationToken::new();
    let worker = TaskWorker::new(
        queue.clone(),
        admission.clone(),
        recommender.clone(),
        matcher.clone(),
        WorkerConfig::from_config(&config),
    );
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    // Build app state
    let state = AppState {
        matcher,
        admission,
        recommender,
        queue,
        notifications,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The worker drains its in-flight batch before the process exits
    shutdown.cancel();
    worker_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
