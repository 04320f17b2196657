//! Background timers for the cache service
//!
//! Two loops run while a [`Housekeeper`] is started:
//! - the expiry sweep, every `check_period`
//! - the quota reset, every `quota_period`
//!
//! Both are plain tokio tasks, so tests can drive them with paused time.

use crate::service::CacheService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Start/stop handle for the sweep and quota-reset loops
#[derive(Default)]
pub struct Housekeeper {
    handles: Vec<JoinHandle<()>>,
}

impl Housekeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the timers for `service`; a no-op if they are already running
    /// or auto cleanup is disabled in the service config
    pub fn start<V: Clone + Send + Sync + 'static>(&mut self, service: Arc<CacheService<V>>) {
        if self.is_running() {
            return;
        }

        let config = service.config();
        if !config.enable_auto_cleanup {
            info!("Automatic cache cleanup disabled");
            return;
        }

        let check_period = config.check_period;
        let quota_period = config.quota_period;

        info!(
            "Starting cache housekeeping (sweep every {:?}, quota reset every {:?})",
            check_period, quota_period
        );

        let store = service.store();
        self.handles.push(tokio::spawn(run_every(check_period, move || {
            let store = store.clone();
            async move {
                let purged = store.purge_expired().await;
                if purged > 0 {
                    debug!("Auto cleanup: {} expired entries", purged);
                }
            }
        })));

        let quota = service.quota();
        self.handles.push(tokio::spawn(run_every(quota_period, move || {
            let quota = quota.clone();
            async move {
                quota.reset().await;
            }
        })));
    }

    /// Abort both loops
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Stopped cache housekeeping");
    }

    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }
}

impl Drop for Housekeeper {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Run `tick` every `period`, first firing one period from now
async fn run_every<F, Fut>(period: Duration, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        tick().await;
    }
}
