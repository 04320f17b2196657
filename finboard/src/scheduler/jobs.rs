//! The dashboard's refresh jobs
//!
//! Jobs call the sources directly rather than through `get_or_set`, persist
//! what they fetched, then drop the cache keys that the fresh data
//! supersedes so the next request recomputes them.

use anyhow::Result;
use chrono::NaiveDate;
use finboard_cache::{patterns, CacheService, Clock};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{Schedule, SchedulerError, TaskScheduler};
use crate::models::ScrapeReport;
use crate::sources::Sources;
use crate::storage::FileStore;

pub const NEWS_SCRAPING: &str = "news-scraping";
pub const EARNINGS_UPDATE: &str = "earnings-update";
pub const AI_SUMMARY: &str = "ai-summary";
pub const CACHE_CLEANUP: &str = "cache-cleanup";
pub const DAILY_UPDATE: &str = "daily-update";
pub const PRE_MARKET: &str = "pre-market";

/// Above this many keys the hourly cleanup drops all news entries
pub const CLEANUP_KEY_THRESHOLD: usize = 5000;

/// Category under which the daily top-five summary is stored
pub const TOP5_SUMMARY_CATEGORY: &str = "Top 5 Market";

const DAILY_UPDATE_CRON: &str = "0 0 1 * * *";
// 08:30 Asia/Taipei on weekdays
const PRE_MARKET_CRON: &str = "0 30 0 * * Mon-Fri";

pub struct RefreshJobs {
    cache: Arc<CacheService<Value>>,
    sources: Sources,
    storage: Arc<FileStore>,
    clock: Arc<dyn Clock>,
}

impl RefreshJobs {
    pub fn new(
        cache: Arc<CacheService<Value>>,
        sources: Sources,
        storage: Arc<FileStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cache,
            sources,
            storage,
            clock,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub async fn news_scraping(&self) -> Result<()> {
        let report = self.scrape_news().await?;
        let removed = self.cache.delete_by_pattern(patterns::NEWS).await?;
        info!(
            "Scheduled news scraping completed: {} articles scraped, {} rejected, {} cache keys invalidated",
            report.success, report.failed, removed
        );
        Ok(())
    }

    pub async fn earnings_update(&self) -> Result<()> {
        let events = self.update_earnings(14).await?;
        self.cache.delete_by_pattern(patterns::EARNINGS).await?;
        self.cache.delete_by_pattern(patterns::ECONOMIC).await?;
        info!("Scheduled earnings update completed: {} events", events);
        Ok(())
    }

    pub async fn ai_summary(&self) -> Result<()> {
        self.generate_summaries(self.today()).await?;
        self.cache.delete_by_pattern(patterns::AI).await?;
        info!("Scheduled AI summary generation completed");
        Ok(())
    }

    pub async fn cache_cleanup(&self) -> Result<()> {
        let stats = self.cache.stats().await;
        info!("Cache stats before cleanup: {}", stats);

        let health = self.cache.health_check().await;
        info!(
            "Cache health check: {} (hit rate {}%, {} keys)",
            health.status, health.stats.hit_rate_percent, health.stats.keys
        );

        let purged = self.cache.store().purge_expired().await;
        if purged > 0 {
            info!("Purged {} expired cache entries", purged);
        }

        if stats.keys > CLEANUP_KEY_THRESHOLD {
            let removed = self.cache.delete_by_pattern(patterns::NEWS).await?;
            info!("Cleaned up old news cache data: {} keys", removed);
        }

        info!("Scheduled cache cleanup completed");
        Ok(())
    }

    pub async fn daily_update(&self) -> Result<()> {
        self.cache.flush_all().await;

        self.scrape_news().await?;
        self.update_earnings(30).await?;
        self.generate_summaries(self.today()).await?;

        info!("Daily comprehensive update completed");
        Ok(())
    }

    pub async fn pre_market(&self) -> Result<()> {
        let today = self.today();
        let earnings = self.sources.earnings.upcoming(1).await?;
        let todays = earnings.iter().filter(|e| e.earnings_date == today).count();

        if todays > 0 {
            info!("Today's earnings: {} companies", todays);
            self.generate_summaries(today).await?;
            self.cache.delete_by_pattern(patterns::AI).await?;
        }

        info!("Pre-market update completed");
        Ok(())
    }

    /// Articles without a title or URL are counted as failed and not stored
    async fn scrape_news(&self) -> Result<ScrapeReport> {
        let (articles, rejected): (Vec<_>, Vec<_>) = self
            .sources
            .news
            .scrape_all()
            .await?
            .into_iter()
            .partition(|a| !a.title.trim().is_empty() && !a.url.trim().is_empty());

        self.storage.save_raw(self.today(), "news", &articles)?;
        Ok(ScrapeReport {
            success: articles.len(),
            failed: rejected.len(),
        })
    }

    async fn update_earnings(&self, days: u32) -> Result<usize> {
        let events = self.sources.earnings.upcoming(days).await?;
        self.storage.save_raw(self.today(), "earnings", &events)?;
        Ok(events.len())
    }

    async fn generate_summaries(&self, date: NaiveDate) -> Result<()> {
        let summary = self.sources.summaries.top5(date).await?;
        self.storage
            .save_summary(date, TOP5_SUMMARY_CATEGORY, &summary.to_markdown())?;
        Ok(())
    }
}

fn bind<F, Fut>(jobs: &Arc<RefreshJobs>, run: F) -> impl Fn() -> Fut + Send + Sync + 'static
where
    F: Fn(Arc<RefreshJobs>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let jobs = jobs.clone();
    move || run(jobs.clone())
}

/// Register the six dashboard jobs, all stopped
pub fn register_default_tasks(
    scheduler: &mut TaskScheduler,
    jobs: Arc<RefreshJobs>,
) -> std::result::Result<(), SchedulerError> {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;

    scheduler.register(
        NEWS_SCRAPING,
        Schedule::every(Duration::from_secs(30 * MINUTE)),
        bind(&jobs, |j| async move { j.news_scraping().await }),
    )?;
    scheduler.register(
        EARNINGS_UPDATE,
        Schedule::every(Duration::from_secs(4 * HOUR)),
        bind(&jobs, |j| async move { j.earnings_update().await }),
    )?;
    scheduler.register(
        AI_SUMMARY,
        Schedule::every(Duration::from_secs(2 * HOUR)),
        bind(&jobs, |j| async move { j.ai_summary().await }),
    )?;
    scheduler.register(
        CACHE_CLEANUP,
        Schedule::every(Duration::from_secs(HOUR)),
        bind(&jobs, |j| async move { j.cache_cleanup().await }),
    )?;
    scheduler.register(
        DAILY_UPDATE,
        Schedule::cron(DAILY_UPDATE_CRON)?,
        bind(&jobs, |j| async move { j.daily_update().await }),
    )?;
    scheduler.register(
        PRE_MARKET,
        Schedule::cron(PRE_MARKET_CRON)?,
        bind(&jobs, |j| async move { j.pre_market().await }),
    )?;

    info!("Scheduled tasks setup completed. Total tasks: {}", scheduler.len());
    Ok(())
}
