//! Fixed-period call counters per provider

use crate::clock::{Clock, SystemClock};
use crate::quota::limits::ProviderLimits;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Caps upstream calls attributable to each provider within a period
///
/// Counters are zeroed by [`QuotaTracker::reset`], which the housekeeper calls
/// once per period. The boundary is also honoured lazily: the first call at or
/// after `period_start + period` rolls the period over before counting.
pub struct QuotaTracker {
    limits: ProviderLimits,
    period: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<QuotaState>,
}

struct QuotaState {
    counts: HashMap<String, u32>,
    period_start: DateTime<Utc>,
}

impl QuotaTracker {
    pub fn new(limits: ProviderLimits, period: Duration) -> Self {
        Self::with_clock(limits, period, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: ProviderLimits, period: Duration, clock: Arc<dyn Clock>) -> Self {
        let period_start = clock.now();
        Self {
            limits,
            period,
            clock,
            state: Mutex::new(QuotaState {
                counts: HashMap::new(),
                period_start,
            }),
        }
    }

    /// Count one call against `provider` if budget remains
    ///
    /// Returns false, without counting, once the provider is at its limit.
    pub async fn increment(&self, provider: &str) -> bool {
        let limit = self.limits.limit_for(provider);
        let mut state = self.state.lock().await;
        self.roll_period(&mut state);

        let current = state.counts.get(provider).copied().unwrap_or(0);
        if current >= limit {
            warn!("API limit reached for {}: {}/{}", provider, current, limit);
            return false;
        }

        state.counts.insert(provider.to_string(), current + 1);
        true
    }

    /// Calls counted for `provider` in the current period
    pub async fn count(&self, provider: &str) -> u32 {
        let mut state = self.state.lock().await;
        self.roll_period(&mut state);
        state.counts.get(provider).copied().unwrap_or(0)
    }

    /// Snapshot of every provider counted in the current period
    pub async fn counts(&self) -> BTreeMap<String, u32> {
        let mut state = self.state.lock().await;
        self.roll_period(&mut state);
        state
            .counts
            .iter()
            .map(|(provider, count)| (provider.clone(), *count))
            .collect()
    }

    /// Zero all counters and start a new period now
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.counts.clear();
        state.period_start = self.clock.now();
        info!("API call counts reset at: {}", state.period_start.to_rfc3339());
    }

    /// Start of the current period
    pub async fn last_reset(&self) -> DateTime<Utc> {
        let mut state = self.state.lock().await;
        self.roll_period(&mut state);
        state.period_start
    }

    pub fn limit_for(&self, provider: &str) -> u32 {
        self.limits.limit_for(provider)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn roll_period(&self, state: &mut QuotaState) {
        // Sub-millisecond periods only roll over through `reset`
        let period = match chrono::Duration::from_std(self.period) {
            Ok(period) if period.num_milliseconds() > 0 => period,
            _ => return,
        };

        let now = self.clock.now();
        let elapsed = now - state.period_start;
        if elapsed < period {
            return;
        }

        let periods = i32::try_from(elapsed.num_milliseconds() / period.num_milliseconds())
            .unwrap_or(i32::MAX)
            .max(1);
        state.counts.clear();
        state.period_start = period
            .checked_mul(periods)
            .and_then(|span| state.period_start.checked_add_signed(span))
            .unwrap_or(now);
        info!(
            "API call counts rolled over at period boundary: {}",
            state.period_start.to_rfc3339()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn tracker(limits: ProviderLimits) -> (QuotaTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let tracker = QuotaTracker::with_clock(limits, Duration::from_secs(3600), clock.clone());
        (tracker, clock)
    }

    #[tokio::test]
    async fn test_ceiling_then_reset() {
        let (tracker, _clock) = tracker(ProviderLimits::default());

        for _ in 0..50 {
            assert!(tracker.increment("openai").await);
        }
        assert!(!tracker.increment("openai").await);
        assert_eq!(tracker.count("openai").await, 50);

        tracker.reset().await;
        assert_eq!(tracker.count("openai").await, 0);
        assert!(tracker.increment("openai").await);
    }

    #[tokio::test]
    async fn test_providers_are_independent() {
        let (tracker, _clock) = tracker(ProviderLimits::uniform(1));

        assert!(tracker.increment("news_api").await);
        assert!(!tracker.increment("news_api").await);
        assert!(tracker.increment("alpha_vantage").await);

        let counts = tracker.counts().await;
        assert_eq!(counts.get("news_api"), Some(&1));
        assert_eq!(counts.get("alpha_vantage"), Some(&1));
    }

    #[tokio::test]
    async fn test_unknown_provider_uses_default() {
        let (tracker, _clock) = tracker(ProviderLimits::default());

        for _ in 0..100 {
            assert!(tracker.increment("polygon").await);
        }
        assert!(!tracker.increment("polygon").await);
        assert_eq!(tracker.limit_for("polygon"), 100);
    }

    #[tokio::test]
    async fn test_period_boundary_rolls_over() {
        let (tracker, clock) = tracker(ProviderLimits::uniform(2));
        let start = tracker.last_reset().await;

        assert!(tracker.increment("openai").await);
        assert!(tracker.increment("openai").await);
        assert!(!tracker.increment("openai").await);

        clock.advance(Duration::from_secs(3599));
        assert!(!tracker.increment("openai").await);

        clock.advance(Duration::from_secs(1));
        assert!(tracker.increment("openai").await);
        assert_eq!(tracker.count("openai").await, 1);
        assert_eq!(
            tracker.last_reset().await - start,
            chrono::Duration::seconds(3600)
        );
    }

    #[tokio::test]
    async fn test_rollover_skips_idle_periods() {
        let (tracker, clock) = tracker(ProviderLimits::default());
        let start = tracker.last_reset().await;

        clock.advance(Duration::from_secs(3 * 3600 + 10));
        assert_eq!(
            tracker.last_reset().await - start,
            chrono::Duration::seconds(3 * 3600)
        );
    }

    #[tokio::test]
    async fn test_sub_millisecond_period_does_not_roll() {
        let clock = Arc::new(ManualClock::starting_now());
        let tracker = QuotaTracker::with_clock(
            ProviderLimits::uniform(1),
            Duration::from_micros(500),
            clock.clone(),
        );

        assert!(tracker.increment("openai").await);
        clock.advance(Duration::from_secs(5));
        assert!(!tracker.increment("openai").await);

        tracker.reset().await;
        assert!(tracker.increment("openai").await);
    }

    #[tokio::test]
    async fn test_rollover_after_very_long_idle() {
        let clock = Arc::new(ManualClock::starting_now());
        let tracker =
            QuotaTracker::with_clock(ProviderLimits::uniform(1), Duration::from_secs(1), clock.clone());
        let start = tracker.last_reset().await;
        assert!(tracker.increment("openai").await);

        // More one-second periods than fit in an i32
        clock.advance(Duration::from_secs(100 * 365 * 24 * 3600));

        assert!(tracker.increment("openai").await);
        let last_reset = tracker.last_reset().await;
        assert!(last_reset > start);
        assert!(last_reset <= clock.now());
    }
}
