use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use finboard_cache::{Clock, SystemClock};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{EarningsSource, NewsSource, Sources, SummaryGenerator};
use crate::models::{EarningsEvent, EconomicEvent, MarketSummary, NewsArticle};

const NEWS_FEED: &str = "news.json";
const EARNINGS_FEED: &str = "earnings.json";
const ECONOMIC_FEED: &str = "economic.json";
const SUMMARIES_FEED: &str = "summaries.json";

/// Sources backed by JSON arrays under `<data_dir>/feeds/`
///
/// Each call re-reads its file, so an external scraper can refresh the
/// feeds while the server runs.
#[derive(Debug)]
pub struct JsonFileSources {
    feeds_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl JsonFileSources {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::with_clock(data_dir, Arc::new(SystemClock))
    }

    pub fn with_clock(data_dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        Self {
            feeds_dir: data_dir.as_ref().join("feeds"),
            clock,
        }
    }

    pub fn feeds_dir(&self) -> &Path {
        &self.feeds_dir
    }

    /// Share one instance as every collaborator
    pub fn into_sources(self) -> Sources {
        let this = Arc::new(self);
        Sources {
            news: this.clone(),
            earnings: this.clone(),
            summaries: this,
        }
    }

    async fn load<T: DeserializeOwned>(&self, feed: &str) -> Result<Vec<T>> {
        let path = self.feeds_dir.join(feed);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read feed: {:?}", path))?;

        let records: Vec<T> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse feed: {:?}", path))?;
        debug!("Loaded {} records from {:?}", records.len(), path);
        Ok(records)
    }

    fn window(&self, days: u32) -> Result<(NaiveDate, NaiveDate)> {
        let today = self.clock.now().date_naive();
        let end = today
            .checked_add_signed(ChronoDuration::days(i64::from(days)))
            .ok_or_else(|| anyhow!("Date window of {} days is out of range", days))?;
        Ok((today, end))
    }
}

#[async_trait]
impl NewsSource for JsonFileSources {
    async fn scrape_all(&self) -> Result<Vec<NewsArticle>> {
        self.load(NEWS_FEED).await
    }

    async fn latest(&self, category: Option<&str>, limit: usize) -> Result<Vec<NewsArticle>> {
        let mut articles: Vec<NewsArticle> = self.load(NEWS_FEED).await?;

        if let Some(category) = category.filter(|c| *c != "all") {
            articles.retain(|a| a.category.eq_ignore_ascii_case(category));
        }
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles.truncate(limit);

        Ok(articles)
    }
}

#[async_trait]
impl EarningsSource for JsonFileSources {
    async fn upcoming(&self, days: u32) -> Result<Vec<EarningsEvent>> {
        let (from, to) = self.window(days)?;
        let mut events: Vec<EarningsEvent> = self.load(EARNINGS_FEED).await?;

        events.retain(|e| e.earnings_date >= from && e.earnings_date <= to);
        events.sort_by(|a, b| a.earnings_date.cmp(&b.earnings_date));

        Ok(events)
    }

    async fn economic_events(&self, days: u32) -> Result<Vec<EconomicEvent>> {
        let (from, to) = self.window(days)?;
        let mut events: Vec<EconomicEvent> = self.load(ECONOMIC_FEED).await?;

        events.retain(|e| e.date >= from && e.date <= to);
        events.sort_by(|a, b| a.date.cmp(&b.date).then(b.importance.cmp(&a.importance)));

        Ok(events)
    }
}

#[async_trait]
impl SummaryGenerator for JsonFileSources {
    async fn top5(&self, date: NaiveDate) -> Result<MarketSummary> {
        let summaries: Vec<MarketSummary> = self.load(SUMMARIES_FEED).await?;

        let mut summary = summaries
            .into_iter()
            .find(|s| s.date == date)
            .ok_or_else(|| anyhow::anyhow!("No market summary available for {}", date))?;
        summary.items.truncate(5);

        Ok(summary)
    }
}
