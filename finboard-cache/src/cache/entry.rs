//! Cache entry with absolute expiry

use crate::cache::types::CacheKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached value and its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: V,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl<V> CacheEntry<V> {
    /// Create an entry written at `now` that lives for `ttl`
    pub fn new(key: CacheKey, value: V, ttl: Duration, now: DateTime<Utc>) -> Self {
        let expires_at = now
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(3600));

        Self {
            key,
            value,
            metadata: CacheMetadata {
                created_at: now,
                expires_at,
                version: 1,
            },
        }
    }

    /// An entry is logically absent once `now >= expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.metadata.expires_at
    }

    /// Overwrite the value in place, restarting its lifetime
    pub fn replace(&mut self, value: V, ttl: Duration, now: DateTime<Utc>) {
        self.value = value;
        self.metadata.created_at = now;
        self.metadata.expires_at = now
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(3600));
        self.metadata.version += 1;
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the current value was written
    pub created_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// Version number (incremented on overwrite)
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(
            "earnings:upcoming:7".to_string(),
            42,
            Duration::from_secs(3600),
            at(0),
        );

        assert_eq!(entry.key, "earnings:upcoming:7");
        assert_eq!(entry.value, 42);
        assert!(!entry.is_expired_at(at(0)));
        assert_eq!(entry.metadata.version, 1);
    }

    #[test]
    fn test_entry_expires_exactly_at_ttl() {
        let entry = CacheEntry::new("k".to_string(), "v", Duration::from_secs(10), at(0));

        assert!(!entry.is_expired_at(at(9)));
        assert!(entry.is_expired_at(at(10)));
        assert!(entry.is_expired_at(at(11)));
    }

    #[test]
    fn test_replace_restarts_lifetime() {
        let mut entry = CacheEntry::new("k".to_string(), "old", Duration::from_secs(10), at(0));

        entry.replace("new", Duration::from_secs(10), at(8));

        assert_eq!(entry.value, "new");
        assert_eq!(entry.metadata.version, 2);
        assert!(!entry.is_expired_at(at(15)));
        assert!(entry.is_expired_at(at(18)));
    }
}
