//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Cache key type
pub type CacheKey = String;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,

    /// Lookups that found nothing or an expired entry
    pub misses: u64,

    /// Number of entries currently stored
    pub keys: usize,

    /// Entries reclaimed because their TTL elapsed
    pub expired: u64,
}

impl CacheStats {
    /// Hit rate as a fraction in `[0, 1]`, 0 when there has been no activity
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Hit rate rounded to a whole percentage
    pub fn hit_rate_percent(&self) -> u32 {
        (self.hit_rate() * 100.0).round() as u32
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {}%, keys: {}, expired: {} }}",
            self.hits,
            self.misses,
            self.hit_rate_percent(),
            self.keys,
            self.expired
        )
    }
}

/// Data category, used to pick a TTL from how volatile and how costly the
/// upstream is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Scraped news articles
    News,

    /// Earnings calendar
    Earnings,

    /// LLM-generated market summaries
    AiSummary,

    /// Quotes and index levels
    MarketData,

    /// Macro calendar and indicators
    EconomicData,
}

impl DataCategory {
    pub const ALL: [DataCategory; 5] = [
        DataCategory::News,
        DataCategory::Earnings,
        DataCategory::AiSummary,
        DataCategory::MarketData,
        DataCategory::EconomicData,
    ];

    /// Default TTL for this category
    pub fn ttl(&self) -> Duration {
        match self {
            DataCategory::News => Duration::from_secs(30 * 60),
            DataCategory::Earnings => Duration::from_secs(4 * 60 * 60),
            DataCategory::AiSummary => Duration::from_secs(2 * 60 * 60),
            DataCategory::MarketData => Duration::from_secs(15 * 60),
            DataCategory::EconomicData => Duration::from_secs(12 * 60 * 60),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::News => "news",
            DataCategory::Earnings => "earnings",
            DataCategory::AiSummary => "ai_summary",
            DataCategory::MarketData => "market_data",
            DataCategory::EconomicData => "economic_data",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown data category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };

        assert_eq!(stats.hit_rate(), 0.8);
        assert_eq!(stats.hit_rate_percent(), 80);
    }

    #[test]
    fn test_cache_stats_zero_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.hit_rate_percent(), 0);
    }

    #[test]
    fn test_cache_stats_display() {
        let stats = CacheStats {
            hits: 2,
            misses: 1,
            keys: 5,
            expired: 3,
        };

        let display = format!("{}", stats);
        assert!(display.contains("hits: 2"));
        assert!(display.contains("hit_rate: 67%"));
    }

    #[test]
    fn test_category_ttls() {
        assert_eq!(DataCategory::News.ttl(), Duration::from_secs(1800));
        assert_eq!(DataCategory::Earnings.ttl(), Duration::from_secs(14_400));
        assert_eq!(DataCategory::AiSummary.ttl(), Duration::from_secs(7200));
        assert_eq!(DataCategory::MarketData.ttl(), Duration::from_secs(900));
        assert_eq!(DataCategory::EconomicData.ttl(), Duration::from_secs(43_200));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("ai_summary".parse::<DataCategory>(), Ok(DataCategory::AiSummary));
        assert!("weather".parse::<DataCategory>().is_err());
        assert_eq!(format!("{}", DataCategory::EconomicData), "economic_data");
    }
}
