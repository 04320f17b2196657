//! Cache health reporting
//!
//! A health report is a pure read of the store and quota counters. The
//! verdict is a heuristic for cache effectiveness and memory pressure; nothing
//! else in the crate acts on it.

use crate::cache::{CacheConfig, CacheStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Overall cache verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Error,
}

impl HealthStatus {
    /// `Error` when too many keys are stored, `Warning` when the hit rate is
    /// below the configured floor, otherwise `Healthy`
    pub fn evaluate(stats: &CacheStats, config: &CacheConfig) -> Self {
        if stats.keys > config.max_healthy_keys {
            HealthStatus::Error
        } else if stats.hit_rate() < config.warning_hit_rate {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Error => write!(f, "error"),
        }
    }
}

/// Counters as reported by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStats {
    pub hits: u64,
    pub misses: u64,
    pub keys: usize,
    pub expired: u64,
    pub hit_rate: f64,
    pub hit_rate_percent: u32,
}

impl From<&CacheStats> for HealthStats {
    fn from(stats: &CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            keys: stats.keys,
            expired: stats.expired,
            hit_rate: stats.hit_rate(),
            hit_rate_percent: stats.hit_rate_percent(),
        }
    }
}

/// Snapshot returned by `CacheService::health_check`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub stats: HealthStats,
    pub api_counts: BTreeMap<String, u32>,
    pub last_reset: DateTime<Utc>,
}

impl HealthReport {
    pub fn new(
        stats: &CacheStats,
        api_counts: BTreeMap<String, u32>,
        last_reset: DateTime<Utc>,
        config: &CacheConfig,
    ) -> Self {
        Self {
            status: HealthStatus::evaluate(stats, config),
            stats: HealthStats::from(stats),
            api_counts,
            last_reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(hits: u64, misses: u64, keys: usize) -> CacheStats {
        CacheStats {
            hits,
            misses,
            keys,
            expired: 0,
        }
    }

    #[test]
    fn test_healthy() {
        let config = CacheConfig::default();
        assert_eq!(
            HealthStatus::evaluate(&stats(9, 1, 10), &config),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthStatus::evaluate(&stats(1, 1, 10), &config),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_low_hit_rate_warns() {
        let config = CacheConfig::default();
        assert_eq!(
            HealthStatus::evaluate(&stats(1, 3, 10), &config),
            HealthStatus::Warning
        );
        // No activity means a 0% hit rate
        assert_eq!(
            HealthStatus::evaluate(&stats(0, 0, 0), &config),
            HealthStatus::Warning
        );
    }

    #[test]
    fn test_key_ceiling_errors() {
        let config = CacheConfig::default();
        assert_eq!(
            HealthStatus::evaluate(&stats(0, 10, 10_001), &config),
            HealthStatus::Error
        );
        assert_eq!(
            HealthStatus::evaluate(&stats(10, 0, 10_000), &config),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn test_report_serialization() {
        let config = CacheConfig::default();
        let mut counts = BTreeMap::new();
        counts.insert("openai".to_string(), 3);

        let report = HealthReport::new(&stats(3, 1, 2), counts, Utc::now(), &config);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "healthy");
        assert_eq!(json["stats"]["hit_rate_percent"], 75);
        assert_eq!(json["api_counts"]["openai"], 3);
    }
}
