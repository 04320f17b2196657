//! Cache key naming conventions
//!
//! Keys are `:`-separated so whole families can be dropped with a prefix
//! pattern such as `^earnings:`.

use crate::cache::types::CacheKey;

/// Builders for the keys used across the dashboard
pub struct CacheKeys;

impl CacheKeys {
    pub fn earnings(days: u32) -> CacheKey {
        format!("earnings:upcoming:{}", days)
    }

    pub fn economic_events(days: u32) -> CacheKey {
        format!("economic:events:{}", days)
    }

    /// `news:<category>:<limit>`, defaulting to `all` and 20
    pub fn news(category: Option<&str>, limit: Option<usize>) -> CacheKey {
        format!(
            "news:{}:{}",
            category.filter(|c| !c.is_empty()).unwrap_or("all"),
            limit.unwrap_or(20)
        )
    }

    pub fn market_sentiment() -> CacheKey {
        "market:sentiment".to_string()
    }

    pub fn ai_summary(date: &str) -> CacheKey {
        format!("ai:summary:{}", date)
    }

    pub fn top5_summary(date: &str) -> CacheKey {
        format!("ai:top5:{}", date)
    }

    pub fn stock_data(symbol: &str) -> CacheKey {
        format!("stock:{}", symbol)
    }

    pub fn market_data(market: &str) -> CacheKey {
        format!("market:{}", market)
    }

    pub fn watchlist_news(symbols: &[&str], limit: usize) -> CacheKey {
        format!("watchlist:news:{}:{}", symbols.join(","), limit)
    }
}

/// Key prefix patterns used for bulk invalidation
pub mod patterns {
    pub const EARNINGS: &str = "^earnings:";
    pub const ECONOMIC: &str = "^economic:";
    pub const NEWS: &str = "^news:";
    pub const AI: &str = "^ai:";
}
