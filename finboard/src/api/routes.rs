//! API routes for the finboard server

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use finboard_cache::{CacheKeys, CacheService, CacheStats, Clock, DataCategory, HealthReport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::scheduler::{SchedulerHealth, TaskScheduler};
use crate::sources::{providers, Sources};
use crate::storage::FileStore;

const DEFAULT_DAYS: u32 = 7;
const MAX_DAYS: u32 = 365;
const DEFAULT_NEWS_LIMIT: usize = 20;
const DEFAULT_DAYS_TO_KEEP: u32 = 30;

/// Application state
pub struct AppState {
    pub cache: Arc<CacheService<Value>>,
    pub scheduler: Arc<TaskScheduler>,
    pub sources: Sources,
    pub storage: Arc<FileStore>,
    pub clock: Arc<dyn Clock>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct CacheStatsResponse {
    pub stats: CacheStats,
    pub health: HealthReport,
}

#[derive(Deserialize, Default)]
pub struct ClearCacheRequest {
    pub pattern: Option<String>,
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
    pub pattern: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksStatusResponse {
    pub tasks: BTreeMap<String, bool>,
    pub schedules: BTreeMap<String, String>,
    pub next_runs: BTreeMap<String, Option<DateTime<Utc>>>,
}

#[derive(Serialize)]
pub struct TaskActionResponse {
    pub success: bool,
    pub task: String,
}

#[derive(Deserialize)]
pub struct DaysQuery {
    pub days: Option<u32>,
}

impl DaysQuery {
    /// Requested look-ahead, rejected above a year
    fn days(&self) -> Result<u32, ApiError> {
        match self.days {
            Some(days) if days > MAX_DAYS => Err(ApiError::BadRequest(format!(
                "days must be at most {}, got {}",
                MAX_DAYS, days
            ))),
            days => Ok(days.unwrap_or(DEFAULT_DAYS)),
        }
    }
}

#[derive(Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    pub days_to_keep: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub removed: usize,
    pub days_to_keep: u32,
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date (expected YYYY-MM-DD): {}", raw)))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Scheduler health with the cache report embedded
pub async fn system_health(State(state): State<Arc<AppState>>) -> Json<SchedulerHealth> {
    let cache_health = state.cache.health_check().await;
    Json(state.scheduler.health_check(cache_health).await)
}

pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        stats: state.cache.stats().await,
        health: state.cache.health_check().await,
    })
}

/// Delete keys matching `pattern`, or everything when no pattern is given
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ClearCacheResponse>, ApiError> {
    let request: ClearCacheRequest = if body.is_empty() {
        ClearCacheRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let cleared = match request.pattern.as_deref() {
        Some(pattern) => state.cache.delete_by_pattern(pattern).await?,
        None => {
            let count = state.cache.store().len().await;
            state.cache.flush_all().await;
            count
        }
    };

    info!("Cleared {} cache keys (pattern: {:?})", cleared, request.pattern);
    Ok(Json(ClearCacheResponse {
        cleared,
        pattern: request.pattern,
    }))
}

pub async fn tasks_status(State(state): State<Arc<AppState>>) -> Json<TasksStatusResponse> {
    Json(TasksStatusResponse {
        tasks: state.scheduler.status().await,
        schedules: state.scheduler.describe(),
        next_runs: state.scheduler.next_runs(),
    })
}

pub async fn run_task(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TaskActionResponse>, ApiError> {
    state.scheduler.run_now(&name).await?;
    Ok(Json(TaskActionResponse {
        success: true,
        task: name,
    }))
}

pub async fn start_task(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TaskActionResponse>, ApiError> {
    if !state.scheduler.start(&name).await {
        return Err(ApiError::NotFound(format!("Task not found: {}", name)));
    }
    Ok(Json(TaskActionResponse {
        success: true,
        task: name,
    }))
}

pub async fn stop_task(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TaskActionResponse>, ApiError> {
    if !state.scheduler.stop(&name).await {
        return Err(ApiError::NotFound(format!("Task not found: {}", name)));
    }
    Ok(Json(TaskActionResponse {
        success: true,
        task: name,
    }))
}

pub async fn upcoming_earnings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DaysQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = params.days()?;
    let source = state.sources.earnings.clone();

    let value = state
        .cache
        .get_or_set_for(
            &CacheKeys::earnings(days),
            || async move {
                let events = source.upcoming(days).await?;
                Ok::<_, anyhow::Error>(serde_json::to_value(events)?)
            },
            DataCategory::Earnings,
            Some(providers::FINANCIAL_MODELING_PREP),
        )
        .await?;

    Ok(Json(value))
}

pub async fn economic_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DaysQuery>,
) -> Result<Json<Value>, ApiError> {
    let days = params.days()?;
    let source = state.sources.earnings.clone();

    let value = state
        .cache
        .get_or_set_for(
            &CacheKeys::economic_events(days),
            || async move {
                let events = source.economic_events(days).await?;
                Ok::<_, anyhow::Error>(serde_json::to_value(events)?)
            },
            DataCategory::EconomicData,
            Some(providers::ALPHA_VANTAGE),
        )
        .await?;

    Ok(Json(value))
}

pub async fn latest_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewsQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_NEWS_LIMIT);
    let key = CacheKeys::news(params.category.as_deref(), Some(limit));
    let source = state.sources.news.clone();
    let category = params.category;

    let value = state
        .cache
        .get_or_set_for(
            &key,
            || async move {
                let articles = source.latest(category.as_deref(), limit).await?;
                Ok::<_, anyhow::Error>(serde_json::to_value(articles)?)
            },
            DataCategory::News,
            Some(providers::NEWS_API),
        )
        .await?;

    Ok(Json(value))
}

pub async fn top5_summaries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateQuery>,
) -> Result<Json<Value>, ApiError> {
    let date = match params.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => state.clock.now().date_naive(),
    };
    let generator = state.sources.summaries.clone();

    let value = state
        .cache
        .get_or_set_for(
            &CacheKeys::top5_summary(&date.to_string()),
            || async move {
                let summary = generator.top5(date).await?;
                Ok::<_, anyhow::Error>(serde_json::to_value(summary)?)
            },
            DataCategory::AiSummary,
            Some(providers::OPENAI),
        )
        .await?;

    Ok(Json(value))
}

/// Dates with stored summaries, newest first
pub async fn summary_dates(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let dates = state.storage.list_dates()?;
    Ok(Json(json!({ "dates": dates })))
}

pub async fn summaries_for_date(
    State(state): State<Arc<AppState>>,
    Path(raw_date): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let date = parse_date(&raw_date)?;
    let summaries = state.storage.summaries_for_date(date)?;
    Ok(Json(json!({ "date": date, "summaries": summaries })))
}

/// One stored summary; 404 when none was written for that date and category
pub async fn stored_summary(
    State(state): State<Arc<AppState>>,
    Path((raw_date, category)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let date = parse_date(&raw_date)?;
    let content = state
        .storage
        .read_summary(date, &category)?
        .ok_or_else(|| ApiError::NotFound("Summary not found".to_string()))?;

    Ok(Json(json!({ "date": date, "category": category, "content": content })))
}

/// Remove summary directories older than `daysToKeep` days (default 30)
pub async fn cleanup_storage(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CleanupResponse>, ApiError> {
    let request: CleanupRequest = if body.is_empty() {
        CleanupRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };
    let days_to_keep = request.days_to_keep.unwrap_or(DEFAULT_DAYS_TO_KEEP);

    let today = state.clock.now().date_naive();
    let removed = state.storage.cleanup_older_than(today, days_to_keep)?;

    info!("Storage cleanup removed {} summary dates older than {} days", removed, days_to_keep);
    Ok(Json(CleanupResponse {
        removed,
        days_to_keep,
    }))
}
