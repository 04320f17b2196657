//! # finboard-cache
//!
//! In-process caching for the finboard dashboard: a TTL store, per-provider
//! call quotas, and a get-or-compute service that puts the two in front of
//! expensive or rate-limited upstreams (LLM calls, financial-data APIs).
//!
//! ## Features
//!
//! - TTL store with regex invalidation and a passive expiry sweep
//! - Fixed-period provider quotas with a default limit table
//! - `get_or_set`: hit short-circuits, miss charges quota then computes
//! - Per-category TTLs (news, earnings, AI summaries, market and economic data)
//! - Health verdict derived from hit rate and key count
//! - Injectable clock so expiry and quota periods can be tested without sleeping
//!
//! ## Get or compute
//!
//! ```no_run
//! use finboard_cache::{CacheConfig, CacheKeys, CacheService, DataCategory};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache: CacheService<String> = CacheService::new(CacheConfig::default());
//!
//!     let summary: String = cache
//!         .get_or_set_for(
//!             &CacheKeys::top5_summary("2024-03-01"),
//!             || async { Ok::<_, anyhow::Error>("five things to watch".to_string()) },
//!             DataCategory::AiSummary,
//!             Some("openai"),
//!         )
//!         .await?;
//!
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Housekeeping
//!
//! ```no_run
//! use finboard_cache::{CacheConfig, CacheService, Housekeeper};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache: Arc<CacheService<String>> = Arc::new(CacheService::new(CacheConfig::default()));
//!
//!     let mut housekeeper = Housekeeper::new();
//!     housekeeper.start(cache.clone());
//!
//!     let report = cache.health_check().await;
//!     println!("Cache status: {}", report.status);
//!
//!     housekeeper.stop();
//! }
//! ```

pub mod cache;
pub mod clock;
pub mod error;
pub mod health;
pub mod housekeeping;
pub mod quota;
pub mod service;

// Re-export main types for convenience
pub use cache::{
    patterns, CacheConfig, CacheConfigBuilder, CacheEntry, CacheKey, CacheKeys, CacheMetadata,
    CacheStats, DataCategory, TtlStore,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, Result};
pub use health::{HealthReport, HealthStats, HealthStatus};
pub use housekeeping::Housekeeper;
pub use quota::{ProviderLimits, QuotaTracker};
pub use service::CacheService;
