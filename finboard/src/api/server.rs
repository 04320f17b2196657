//! API server for finboard

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use finboard_cache::{CacheConfig, CacheService, Clock, Housekeeper, SystemClock};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::scheduler::{register_default_tasks, RefreshJobs, SchedulerError, TaskScheduler};
use crate::sources::{JsonFileSources, Sources};
use crate::storage::FileStore;

use super::routes::{
    cache_stats, cleanup_storage, clear_cache, economic_events, health_check, latest_news,
    run_task, start_task, stop_task, stored_summary, summaries_for_date, summary_dates,
    system_health, tasks_status, top5_summaries, upcoming_earnings, AppState,
};

/// Wire the cache, scheduler and collaborators into one shared state
///
/// The default jobs are registered but not started.
pub fn build_state(
    cache: Arc<CacheService<serde_json::Value>>,
    sources: Sources,
    storage: Arc<FileStore>,
    clock: Arc<dyn Clock>,
) -> std::result::Result<Arc<AppState>, SchedulerError> {
    let jobs = Arc::new(RefreshJobs::new(
        cache.clone(),
        sources.clone(),
        storage.clone(),
        clock.clone(),
    ));

    let mut scheduler = TaskScheduler::with_clock(clock.clone());
    register_default_tasks(&mut scheduler, jobs)?;

    Ok(Arc::new(AppState {
        cache,
        scheduler: Arc::new(scheduler),
        sources,
        storage,
        clock,
    }))
}

/// State for a process reading feeds and writing summaries under the
/// configured data directory
pub fn state_from_config(config: &AppConfig) -> Result<Arc<AppState>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(CacheService::try_new(CacheConfig::default())?);
    let sources = JsonFileSources::with_clock(&config.data_dir, clock.clone()).into_sources();
    let storage = Arc::new(FileStore::with_clock(&config.data_dir, clock.clone()));

    Ok(build_state(cache, sources, storage, clock)?)
}

/// All routes over `state`
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // System
        .route("/api/system/health", get(system_health))
        .route("/api/system/cache/stats", get(cache_stats))
        .route("/api/system/cache/clear", post(clear_cache))
        .route("/api/system/tasks/status", get(tasks_status))
        .route("/api/system/tasks/:name/run", post(run_task))
        .route("/api/system/tasks/:name/start", post(start_task))
        .route("/api/system/tasks/:name/stop", post(stop_task))
        // Resources
        .route("/api/earnings/upcoming", get(upcoming_earnings))
        .route("/api/economic/events", get(economic_events))
        .route("/api/news", get(latest_news))
        .route("/api/ai-summaries/top5", get(top5_summaries))
        .route("/api/summaries/dates", get(summary_dates))
        .route("/api/summaries/:date", get(summaries_for_date))
        // Storage
        .route("/api/storage/summaries/:date/:category", get(stored_summary))
        .route("/api/storage/cleanup", post(cleanup_storage))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    config: AppConfig,
}

impl ApiServer {
    /// Create a new API server with configuration
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Serve until ctrl-c, running housekeeping and every scheduled task
    pub async fn start(self) -> Result<()> {
        let state = state_from_config(&self.config)?;

        let mut housekeeper = Housekeeper::new();
        housekeeper.start(state.cache.clone());
        state.scheduler.start_all().await;

        let app = router(state.clone());

        let addr = self.config.bind_addr();
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        state.scheduler.stop_all().await;
        housekeeper.stop();
        info!("API server stopped");

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
