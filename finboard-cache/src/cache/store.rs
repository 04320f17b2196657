//! In-memory TTL store

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheStats},
};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Key/value store with per-entry expiry
///
/// This implementation provides:
/// - Async access via RwLock, held only for the duration of one operation
/// - Expiry re-checked on every read, so the sweep is only memory reclamation
/// - Regex-based enumeration and bulk deletion
/// - Hit/miss accounting for lookups
pub struct TtlStore<V> {
    /// Cache configuration
    config: CacheConfig,

    /// Time source for expiry decisions
    clock: Arc<dyn Clock>,

    /// Internal storage
    store: RwLock<StoreInner<V>>,
}

/// Internal storage
struct StoreInner<V> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<V>>,

    /// Running counters; `keys` is filled in on read
    stats: CacheStats,
}

impl<V> StoreInner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<V: Clone + Send + Sync> TtlStore<V> {
    /// Create a store on the wall clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a store on a supplied clock
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            store: RwLock::new(StoreInner::new()),
        }
    }

    /// Get a live value
    ///
    /// `None` means absent or expired. An expired entry is dropped on the
    /// way out. Reads never extend the TTL.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let expired = match store.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                store.stats.hits += 1;
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            store.entries.remove(key);
            store.stats.expired += 1;
        }
        store.stats.misses += 1;
        None
    }

    /// Insert or overwrite a value
    ///
    /// `ttl` of `None` uses the configured default.
    pub async fn set(&self, key: impl Into<CacheKey>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = self.config.ttl_or_default(ttl);
        let now = self.clock.now();
        let mut store = self.store.write().await;

        if let Some(existing) = store.entries.get_mut(&key) {
            debug!("Updating existing cache entry: {} (ttl {:?})", key, ttl);
            existing.replace(value, ttl, now);
        } else {
            debug!("Inserting new cache entry: {} (ttl {:?})", key, ttl);
            store
                .entries
                .insert(key.clone(), CacheEntry::new(key, value, ttl, now));
        }
    }

    /// Remove a key, returning how many entries were removed
    pub async fn delete(&self, key: &str) -> usize {
        let mut store = self.store.write().await;
        match store.entries.remove(key) {
            Some(_) => {
                debug!("Removed cache entry: {}", key);
                1
            }
            None => 0,
        }
    }

    /// Remove every key matching a regular expression
    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        let mut store = self.store.write().await;

        let before = store.entries.len();
        store.entries.retain(|key, _| !regex.is_match(key));
        let removed = before - store.entries.len();

        info!("Deleted {} cache entries matching {}", removed, pattern);
        Ok(removed)
    }

    /// List stored keys, optionally filtered by a regular expression
    pub async fn keys(&self, pattern: Option<&str>) -> Result<Vec<CacheKey>> {
        let regex = pattern.map(Regex::new).transpose()?;
        let store = self.store.read().await;

        let mut keys: Vec<CacheKey> = store
            .entries
            .keys()
            .filter(|key| regex.as_ref().map_or(true, |r| r.is_match(key)))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Clear all entries
    pub async fn flush_all(&self) {
        let mut store = self.store.write().await;
        let count = store.entries.len();
        store.entries.clear();
        info!("Flushed {} entries from cache", count);
    }

    /// Drop every expired entry, returning how many were reclaimed
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut guard = self.store.write().await;
        let store = &mut *guard;

        let before = store.entries.len();
        store.entries.retain(|_, entry| !entry.is_expired_at(now));
        let purged = before - store.entries.len();
        store.stats.expired += purged as u64;

        if purged > 0 {
            debug!("Purged {} expired entries", purged);
        }
        purged
    }

    /// Number of stored entries, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.entries.is_empty()
    }

    /// Snapshot of the counters
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        CacheStats {
            keys: store.entries.len(),
            ..store.stats.clone()
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
