//! Per-provider call ceilings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Limit for providers missing from the table
pub const DEFAULT_PROVIDER_LIMIT: u32 = 100;

/// Provider name -> maximum calls per quota period
///
/// These are local defensive caps, not the upstreams' published quotas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderLimits {
    limits: HashMap<String, u32>,
    default_limit: u32,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        let limits = [
            ("alpha_vantage", 500),
            ("news_api", 100),
            ("financial_modeling_prep", 250),
            ("openai", 50),
            ("google_news", 1000),
        ]
        .into_iter()
        .map(|(provider, limit)| (provider.to_string(), limit))
        .collect();

        Self {
            limits,
            default_limit: DEFAULT_PROVIDER_LIMIT,
        }
    }
}

impl ProviderLimits {
    /// Empty table where every provider gets `default_limit`
    pub fn uniform(default_limit: u32) -> Self {
        Self {
            limits: HashMap::new(),
            default_limit,
        }
    }

    /// Set or replace one provider's limit
    pub fn with_limit(mut self, provider: impl Into<String>, limit: u32) -> Self {
        self.limits.insert(provider.into(), limit);
        self
    }

    /// Set the fallback limit
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn limit_for(&self, provider: &str) -> u32 {
        self.limits
            .get(provider)
            .copied()
            .unwrap_or(self.default_limit)
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let limits = ProviderLimits::default();
        assert_eq!(limits.limit_for("alpha_vantage"), 500);
        assert_eq!(limits.limit_for("news_api"), 100);
        assert_eq!(limits.limit_for("financial_modeling_prep"), 250);
        assert_eq!(limits.limit_for("openai"), 50);
        assert_eq!(limits.limit_for("google_news"), 1000);
        assert_eq!(limits.limit_for("unknown_provider"), 100);
    }

    #[test]
    fn test_overrides() {
        let limits = ProviderLimits::default()
            .with_limit("openai", 5)
            .with_default_limit(10);

        assert_eq!(limits.limit_for("openai"), 5);
        assert_eq!(limits.limit_for("polygon"), 10);
        assert_eq!(ProviderLimits::uniform(3).limit_for("alpha_vantage"), 3);
    }
}
