//! Cache-or-compute orchestration
//!
//! [`CacheService`] is the single place that decides between serving a cached
//! value and calling an upstream. It owns one [`TtlStore`] and one
//! [`QuotaTracker`]; construct one per process and share it behind an `Arc`.

use crate::cache::{CacheConfig, CacheKey, CacheStats, DataCategory, TtlStore};
use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, Result};
use crate::health::HealthReport;
use crate::quota::QuotaTracker;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

pub struct CacheService<V> {
    config: CacheConfig,
    store: Arc<TtlStore<V>>,
    quota: Arc<QuotaTracker>,
}

impl<V: Clone + Send + Sync + 'static> CacheService<V> {
    /// Create a service on the wall clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a service whose store and quota periods follow `clock`
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(TtlStore::with_clock(config.clone(), clock.clone()));
        let quota = Arc::new(QuotaTracker::with_clock(
            config.provider_limits.clone(),
            config.quota_period,
            clock,
        ));

        Self {
            config,
            store,
            quota,
        }
    }

    /// Validate the configuration before building the service
    pub fn try_new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Return the cached value for `key`, or compute, store and return it
    ///
    /// - A live entry is returned as-is; `compute` is not called and no quota
    ///   is charged.
    /// - On a miss with a `provider`, one call is charged to that provider
    ///   first. An exhausted quota fails with
    ///   [`CacheError::RateLimitExceeded`] and `compute` is not called.
    /// - A failing `compute` returns its error unchanged and caches nothing.
    ///
    /// Concurrent misses on the same key are not coalesced: each caller
    /// computes and charges quota, and the last write wins.
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
        provider: Option<&str>,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: From<CacheError> + std::fmt::Display,
    {
        if let Some(cached) = self.store.get(key).await {
            debug!("Cache hit for key: {}", key);
            return Ok(cached);
        }

        if let Some(provider) = provider {
            if !self.quota.increment(provider).await {
                return Err(CacheError::RateLimitExceeded {
                    provider: provider.to_string(),
                }
                .into());
            }
        }

        debug!("Cache miss for key: {}, fetching data...", key);

        match compute().await {
            Ok(value) => {
                self.store.set(key, value.clone(), ttl).await;
                Ok(value)
            }
            Err(e) => {
                error!("Error fetching data for key {}: {}", key, e);
                Err(e)
            }
        }
    }

    /// [`get_or_set`](Self::get_or_set) with the TTL taken from `category`
    pub async fn get_or_set_for<F, Fut, E>(
        &self,
        key: &str,
        compute: F,
        category: DataCategory,
        provider: Option<&str>,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        E: From<CacheError> + std::fmt::Display,
    {
        self.get_or_set(key, compute, Some(category.ttl()), provider)
            .await
    }

    /// Store a value with the TTL for its data category
    pub async fn set_with_category(&self, key: impl Into<CacheKey>, value: V, category: DataCategory) {
        self.store.set(key, value, Some(category.ttl())).await;
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.get(key).await
    }

    pub async fn set(&self, key: impl Into<CacheKey>, value: V, ttl: Option<Duration>) {
        self.store.set(key, value, ttl).await;
    }

    pub async fn delete(&self, key: &str) -> usize {
        self.store.delete(key).await
    }

    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        self.store.delete_by_pattern(pattern).await
    }

    pub async fn keys(&self, pattern: Option<&str>) -> Result<Vec<CacheKey>> {
        self.store.keys(pattern).await
    }

    pub async fn flush_all(&self) {
        self.store.flush_all().await;
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }

    /// Health verdict plus counters; reads only
    pub async fn health_check(&self) -> HealthReport {
        let stats = self.store.stats().await;
        let api_counts = self.quota.counts().await;
        let last_reset = self.quota.last_reset().await;
        HealthReport::new(&stats, api_counts, last_reset, &self.config)
    }

    pub fn store(&self) -> Arc<TtlStore<V>> {
        self.store.clone()
    }

    pub fn quota(&self) -> Arc<QuotaTracker> {
        self.quota.clone()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
