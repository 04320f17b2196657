//! Upstream data collaborators
//!
//! Scraping and LLM prompting live behind these traits; the rest of the
//! system only sees a fetch that returns records or fails.

mod file;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::models::{EarningsEvent, EconomicEvent, MarketSummary, NewsArticle};

pub use file::JsonFileSources;

/// Provider names used for quota accounting
pub mod providers {
    pub const ALPHA_VANTAGE: &str = "alpha_vantage";
    pub const NEWS_API: &str = "news_api";
    pub const FINANCIAL_MODELING_PREP: &str = "financial_modeling_prep";
    pub const OPENAI: &str = "openai";
    pub const GOOGLE_NEWS: &str = "google_news";
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Pull every configured feed
    async fn scrape_all(&self) -> Result<Vec<NewsArticle>>;

    /// Most recent articles first, optionally restricted to one category
    async fn latest(&self, category: Option<&str>, limit: usize) -> Result<Vec<NewsArticle>>;
}

#[async_trait]
pub trait EarningsSource: Send + Sync {
    /// Earnings releases from today through `days` days ahead
    async fn upcoming(&self, days: u32) -> Result<Vec<EarningsEvent>>;

    async fn economic_events(&self, days: u32) -> Result<Vec<EconomicEvent>>;
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Five most important market stories for `date`
    async fn top5(&self, date: NaiveDate) -> Result<MarketSummary>;
}

/// The set of collaborators shared by jobs and handlers
#[derive(Clone)]
pub struct Sources {
    pub news: Arc<dyn NewsSource>,
    pub earnings: Arc<dyn EarningsSource>,
    pub summaries: Arc<dyn SummaryGenerator>,
}
