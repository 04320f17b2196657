//! Configuration for the cache system

use crate::error::{CacheError, Result};
use crate::quota::ProviderLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Shortest quota period `validate` accepts
pub const MIN_QUOTA_PERIOD: Duration = Duration::from_secs(1);

/// Configuration for the cache service
///
/// Defaults:
/// - Default TTL: 1 hour when a caller supplies none
/// - Expired entries swept every 10 minutes
/// - Provider quotas reset every hour
/// - Health degrades below a 50% hit rate, errors above 10,000 keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live applied when `set` is called without one
    pub default_ttl: Duration,

    /// Interval of the passive expiry sweep
    pub check_period: Duration,

    /// Length of a provider quota period
    pub quota_period: Duration,

    /// Per-provider call ceilings
    pub provider_limits: ProviderLimits,

    /// Hit rate under which health is reported as `warning`
    pub warning_hit_rate: f64,

    /// Stored key count above which health is reported as `error`
    pub max_healthy_keys: usize,

    /// Run the sweep and quota-reset timers when the housekeeper is started
    pub enable_auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            check_period: Duration::from_secs(600),
            quota_period: Duration::from_secs(3600),
            provider_limits: ProviderLimits::default(),
            warning_hit_rate: 0.5,
            max_healthy_keys: 10_000,
            enable_auto_cleanup: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_zero() {
            return Err(CacheError::Config(
                "default_ttl must be greater than 0".to_string(),
            ));
        }

        if self.check_period.is_zero() {
            return Err(CacheError::Config(
                "check_period must be greater than 0".to_string(),
            ));
        }

        if self.quota_period < MIN_QUOTA_PERIOD {
            return Err(CacheError::Config(
                "quota_period must be at least 1 second".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.warning_hit_rate) {
            return Err(CacheError::Config(
                "warning_hit_rate must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// TTL for a write, falling back to the default
    pub fn ttl_or_default(&self, requested: Option<Duration>) -> Duration {
        requested.unwrap_or(self.default_ttl)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    check_period: Option<Duration>,
    quota_period: Option<Duration>,
    provider_limits: Option<ProviderLimits>,
    warning_hit_rate: Option<f64>,
    max_healthy_keys: Option<usize>,
    enable_auto_cleanup: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set the expiry sweep interval
    pub fn check_period(mut self, period: Duration) -> Self {
        self.check_period = Some(period);
        self
    }

    /// Set the quota reset period
    pub fn quota_period(mut self, period: Duration) -> Self {
        self.quota_period = Some(period);
        self
    }

    /// Replace the provider limit table
    pub fn provider_limits(mut self, limits: ProviderLimits) -> Self {
        self.provider_limits = Some(limits);
        self
    }

    /// Set the hit rate under which health degrades to `warning`
    pub fn warning_hit_rate(mut self, rate: f64) -> Self {
        self.warning_hit_rate = Some(rate);
        self
    }

    /// Set the key count above which health is `error`
    pub fn max_healthy_keys(mut self, max: usize) -> Self {
        self.max_healthy_keys = Some(max);
        self
    }

    /// Enable or disable automatic cleanup
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            check_period: self.check_period.unwrap_or(defaults.check_period),
            quota_period: self.quota_period.unwrap_or(defaults.quota_period),
            provider_limits: self.provider_limits.unwrap_or(defaults.provider_limits),
            warning_hit_rate: self.warning_hit_rate.unwrap_or(defaults.warning_hit_rate),
            max_healthy_keys: self.max_healthy_keys.unwrap_or(defaults.max_healthy_keys),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.check_period, Duration::from_secs(600));
        assert_eq!(config.quota_period, Duration::from_secs(3600));
        assert_eq!(config.max_healthy_keys, 10_000);
        assert!(config.enable_auto_cleanup);
    }

    #[test]
    fn test_config_validation() {
        let valid_config = CacheConfig::default();
        assert!(valid_config.validate().is_ok());

        let mut invalid_config = CacheConfig::default();
        invalid_config.default_ttl = Duration::ZERO;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.quota_period = Duration::from_micros(500);
        assert!(invalid_config.validate().is_err());

        let mut edge_config = CacheConfig::default();
        edge_config.quota_period = MIN_QUOTA_PERIOD;
        assert!(edge_config.validate().is_ok());

        let mut invalid_config = CacheConfig::default();
        invalid_config.warning_hit_rate = -0.1;
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_secs(600))
            .check_period(Duration::from_secs(30))
            .max_healthy_keys(500)
            .build();

        assert_eq!(config.default_ttl, Duration::from_secs(600));
        assert_eq!(config.check_period, Duration::from_secs(30));
        assert_eq!(config.max_healthy_keys, 500);
        assert_eq!(config.quota_period, Duration::from_secs(3600));
    }

    #[test]
    fn test_ttl_or_default() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl_or_default(None), Duration::from_secs(3600));
        assert_eq!(
            config.ttl_or_default(Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
    }
}
