//! Integration tests for the cache service
//!
//! These tests verify the complete cache behaviour including:
//! - Hit and expiry correctness of the TTL store
//! - Provider quota ceilings and resets
//! - get-or-compute semantics on hits, misses and failures
//! - Pattern invalidation
//! - Behaviour of concurrent misses on one key

use finboard_cache::{
    CacheConfig, CacheError, CacheKeys, CacheService, DataCategory, HealthStatus, ManualClock,
    TtlStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn manual_service<V: Clone + Send + Sync + 'static>() -> (CacheService<V>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let service = CacheService::with_clock(CacheConfig::default(), clock.clone());
    (service, clock)
}

#[tokio::test]
async fn test_hit_correctness() {
    let (service, clock) = manual_service::<String>();

    for (i, ttl) in [1u64, 60, 3600].into_iter().enumerate() {
        let key = format!("stock:SYM{}", i);
        service
            .set(key.clone(), format!("value-{}", i), Some(Duration::from_secs(ttl)))
            .await;
    }

    clock.advance(Duration::from_millis(500));

    for i in 0..3 {
        assert_eq!(
            service.get(&format!("stock:SYM{}", i)).await,
            Some(format!("value-{}", i))
        );
    }
}

#[tokio::test]
async fn test_expiry_without_sweep() {
    let (service, clock) = manual_service::<u32>();

    service.set("x", 42, Some(Duration::from_secs(1))).await;
    assert_eq!(service.get("x").await, Some(42));

    clock.advance(Duration::from_millis(1100));
    assert_eq!(service.get("x").await, None);
}

#[tokio::test]
async fn test_expiry_on_wall_clock() {
    let store: TtlStore<u32> = TtlStore::new(CacheConfig::default());

    store.set("x", 42, Some(Duration::from_secs(1))).await;
    assert_eq!(store.get("x").await, Some(42));

    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(store.get("x").await, None);
}

#[tokio::test]
async fn test_quota_ceiling_then_reset() {
    let (service, _clock) = manual_service::<String>();
    let quota = service.quota();

    for _ in 0..50 {
        assert!(quota.increment("openai").await);
    }
    assert!(!quota.increment("openai").await);

    quota.reset().await;
    assert!(quota.increment("openai").await);
}

#[tokio::test]
async fn test_compute_on_miss_only() {
    let (service, _clock) = manual_service::<Vec<String>>();
    let calls = AtomicUsize::new(0);
    let calls = &calls;
    let key = CacheKeys::earnings(7);

    let compute = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, anyhow::Error>(vec!["AAPL".to_string(), "MSFT".to_string()])
    };

    let first = service.get_or_set(&key, compute, None, None).await.unwrap();
    let second = service.get_or_set(&key, compute, None, None).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(service.get(&key).await, Some(first));
}

#[tokio::test]
async fn test_hit_short_circuits_throwing_compute() {
    let (service, _clock) = manual_service::<String>();
    service.set("summary:today", "cached".to_string(), None).await;

    let result: anyhow::Result<String> = service
        .get_or_set(
            "summary:today",
            || async { Err(anyhow::anyhow!("provider exploded")) },
            None,
            Some("openai"),
        )
        .await;

    assert_eq!(result.unwrap(), "cached");
}

#[tokio::test]
async fn test_failed_compute_is_not_cached() {
    let (service, _clock) = manual_service::<String>();

    let result: anyhow::Result<String> = service
        .get_or_set(
            "news:all:20",
            || async { Err(anyhow::anyhow!("scrape failed")) },
            None,
            Some("news_api"),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(service.store().get("news:all:20").await, None);

    let retried: anyhow::Result<String> = service
        .get_or_set(
            "news:all:20",
            || async { Ok("fresh".to_string()) },
            None,
            Some("news_api"),
        )
        .await;
    assert_eq!(retried.unwrap(), "fresh");
}

#[tokio::test]
async fn test_pattern_delete() {
    let (service, _clock) = manual_service::<u32>();

    service.set(CacheKeys::earnings(7), 1, None).await;
    service.set(CacheKeys::earnings(14), 2, None).await;
    service.set(CacheKeys::news(None, Some(20)), 3, None).await;

    let removed = service.delete_by_pattern("^earnings:").await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(service.keys(None).await.unwrap(), vec!["news:all:20".to_string()]);
}

#[tokio::test]
async fn test_rate_limited_summary() {
    let (service, _clock) = manual_service::<String>();
    let quota = service.quota();

    for _ in 0..50 {
        assert!(quota.increment("openai").await);
    }
    assert!(!quota.increment("openai").await);

    let calls = AtomicUsize::new(0);
    let calls = &calls;
    let result: Result<String, CacheError> = service
        .get_or_set(
            "summary:today",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("summary".to_string())
            },
            Some(Duration::from_secs(7200)),
            Some("openai"),
        )
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "API rate limit exceeded for openai");
    assert!(err.is_retryable());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rate_limit_reaches_anyhow_callers() {
    let config = CacheConfig::builder()
        .provider_limits(finboard_cache::ProviderLimits::uniform(0))
        .build();
    let service: CacheService<u32> = CacheService::new(config);

    let result: anyhow::Result<u32> = service
        .get_or_set("k", || async { Ok(1) }, None, Some("alpha_vantage"))
        .await;

    let err = result.unwrap_err();
    let cache_err = err.downcast_ref::<CacheError>().unwrap();
    assert!(matches!(
        cache_err,
        CacheError::RateLimitExceeded { provider } if provider == "alpha_vantage"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_misses_both_compute() {
    let (service, _clock) = manual_service::<u32>();
    let calls = AtomicUsize::new(0);
    let calls = &calls;

    let slow_compute = move || async move {
        let n = calls.fetch_add(1, Ordering::SeqCst) as u32;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, anyhow::Error>(n + 1)
    };

    let (a, b) = tokio::join!(
        service.get_or_set("k", slow_compute, None, Some("openai")),
        service.get_or_set("k", slow_compute, None, Some("openai")),
    );

    // No single-flight: both callers miss, both compute, both are charged
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(service.quota().count("openai").await, 2);
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a, b);

    let cached = service.get("k").await.unwrap();
    assert!(cached == a || cached == b);
}

#[tokio::test]
async fn test_category_entry_point() {
    let (service, clock) = manual_service::<String>();

    let value: anyhow::Result<String> = service
        .get_or_set_for(
            &CacheKeys::news(Some("tech"), Some(10)),
            || async { Ok("headlines".to_string()) },
            DataCategory::News,
            Some("news_api"),
        )
        .await;
    assert_eq!(value.unwrap(), "headlines");

    clock.advance(DataCategory::News.ttl());
    assert_eq!(service.get("news:tech:10").await, None);
}

#[tokio::test]
async fn test_health_report_tracks_activity() {
    let (service, _clock) = manual_service::<u32>();

    let report = service.health_check().await;
    assert_eq!(report.status, HealthStatus::Warning);

    service.set("a", 1, None).await;
    service.get("a").await;
    service.get("a").await;
    service.get("missing").await;
    service.quota().increment("google_news").await;

    let report = service.health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);
    assert_eq!(report.stats.hits, 2);
    assert_eq!(report.stats.misses, 1);
    assert_eq!(report.stats.hit_rate_percent, 67);
    assert_eq!(report.api_counts.get("google_news"), Some(&1));
}

#[tokio::test]
async fn test_health_error_on_key_ceiling() {
    let config = CacheConfig::builder().max_healthy_keys(3).build();
    let service: CacheService<u32> = CacheService::new(config);

    for i in 0..4 {
        service.set(format!("stock:{}", i), i, None).await;
        service.get(&format!("stock:{}", i)).await;
    }

    assert_eq!(service.health_check().await.status, HealthStatus::Error);
}

#[tokio::test]
async fn test_flush_all() {
    let (service, _clock) = manual_service::<u32>();

    service.set("a", 1, None).await;
    service.set("b", 2, None).await;
    service.flush_all().await;

    assert!(service.keys(None).await.unwrap().is_empty());
    assert_eq!(service.stats().await.keys, 0);
}
