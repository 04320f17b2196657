//! # TTL Cache Layer
//!
//! In-memory key/value storage with absolute per-entry expiry.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: every entry carries an absolute expiry, checked on each read
//! - **Passive Sweep**: a periodic purge reclaims memory held by expired entries
//! - **Pattern Invalidation**: regex-based enumeration and bulk deletion of key families
//! - **Smart TTL**: per-category lifetimes for news, earnings, summaries, market and economic data
//!
//! ## Example
//!
//! ```rust
//! use finboard_cache::cache::{CacheConfig, TtlStore};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CacheConfig::builder()
//!     .default_ttl(Duration::from_secs(3600))
//!     .build();
//!
//! let store: TtlStore<String> = TtlStore::new(config);
//!
//! store.set("earnings:upcoming:7", "cached response".to_string(), None).await;
//!
//! if let Some(value) = store.get("earnings:upcoming:7").await {
//!     println!("Cache hit: {}", value);
//! }
//!
//! let removed = store.delete_by_pattern("^earnings:").await?;
//! assert_eq!(removed, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod keys;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use keys::{patterns, CacheKeys};
pub use store::TtlStore;
pub use types::{CacheKey, CacheStats, DataCategory};
