//! Named background jobs with independent start/stop
//!
//! Each [`ScheduledTask`] pairs a [`Schedule`] with an async job. Starting a
//! task spawns a loop that sleeps until the next due time and runs the job;
//! stopping aborts the loop. Job errors and panics are logged and never end
//! the loop.

pub mod jobs;

use chrono::{DateTime, Utc};
use finboard_cache::{Clock, HealthReport, HealthStatus, SystemClock};
use futures::future::BoxFuture;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub use jobs::{register_default_tasks, RefreshJobs};

/// Scheduler errors
#[derive(thiserror::Error, Debug)]
pub enum SchedulerError {
    #[error("Task not found: {0}")]
    UnknownTask(String),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),

    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error("Task {name} failed: {reason}")]
    JobFailed { name: String, reason: String },
}

pub type Job = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// When a task fires
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fixed period, first run one period after start
    Every(Duration),
    /// Six-field cron expression (seconds first), evaluated in UTC
    Cron {
        expression: String,
        schedule: Box<cron::Schedule>,
    },
}

impl Schedule {
    pub fn every(period: Duration) -> Self {
        Schedule::Every(period)
    }

    pub fn cron(expression: &str) -> Result<Self, SchedulerError> {
        let schedule =
            cron::Schedule::from_str(expression).map_err(|e| SchedulerError::InvalidSchedule {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Schedule::Cron {
            expression: expression.to_string(),
            schedule: Box::new(schedule),
        })
    }

    /// Next fire time strictly after `now`
    pub fn next_run(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Schedule::Every(period) => chrono::Duration::from_std(*period).ok().map(|p| now + p),
            Schedule::Cron { schedule, .. } => schedule.after(&now).next(),
        }
    }

    fn delay_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Schedule::Every(period) => Some(*period),
            Schedule::Cron { .. } => self
                .next_run(now)
                .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO)),
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Every(period) => {
                let secs = period.as_secs();
                if secs >= 3600 && secs % 3600 == 0 {
                    write!(f, "every {}h", secs / 3600)
                } else if secs >= 60 && secs % 60 == 0 {
                    write!(f, "every {}m", secs / 60)
                } else {
                    write!(f, "every {}s", secs)
                }
            }
            Schedule::Cron { expression, .. } => write!(f, "cron '{}' (UTC)", expression),
        }
    }
}

/// A registered job and its running loop, if any
pub struct ScheduledTask {
    name: String,
    schedule: Schedule,
    job: Job,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduledTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

/// Scheduler health as reported by the system endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerHealth {
    pub status: HealthStatus,
    pub active_tasks: usize,
    pub total_tasks: usize,
    pub task_status: BTreeMap<String, bool>,
    pub cache_health: HealthReport,
}

pub struct TaskScheduler {
    tasks: BTreeMap<String, ScheduledTask>,
    clock: Arc<dyn Clock>,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Cron delays are computed against `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: BTreeMap::new(),
            clock,
        }
    }

    /// Add a stopped task
    pub fn register<F, Fut>(&mut self, name: &str, schedule: Schedule, job: F) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if self.tasks.contains_key(name) {
            return Err(SchedulerError::DuplicateTask(name.to_string()));
        }

        let boxed: Job = Arc::new(move || -> BoxFuture<'static, anyhow::Result<()>> { Box::pin(job()) });
        self.tasks.insert(
            name.to_string(),
            ScheduledTask {
                name: name.to_string(),
                schedule,
                job: boxed,
                handle: Mutex::new(None),
            },
        );
        Ok(())
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ScheduledTask> {
        self.tasks.get(name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Begin the task's loop; true if the task exists (already running
    /// counts as started)
    pub async fn start(&self, name: &str) -> bool {
        let Some(task) = self.tasks.get(name) else {
            error!("Task not found: {}", name);
            return false;
        };

        let mut handle = task.handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return true;
        }

        *handle = Some(tokio::spawn(run_loop(
            task.name.clone(),
            task.schedule.clone(),
            task.job.clone(),
            self.clock.clone(),
        )));
        info!("Started task: {} ({})", name, task.schedule);
        true
    }

    /// Abort the task's loop; a job already in flight runs to completion
    pub async fn stop(&self, name: &str) -> bool {
        let Some(task) = self.tasks.get(name) else {
            error!("Task not found: {}", name);
            return false;
        };

        if let Some(handle) = task.handle.lock().await.take() {
            handle.abort();
        }
        info!("Stopped task: {}", name);
        true
    }

    pub async fn start_all(&self) {
        info!("Starting all scheduled tasks...");
        for name in self.tasks.keys() {
            self.start(name).await;
        }
    }

    pub async fn stop_all(&self) {
        info!("Stopping all scheduled tasks...");
        for name in self.tasks.keys() {
            self.stop(name).await;
        }
    }

    /// Run a task's job once now, independent of its loop
    pub async fn run_now(&self, name: &str) -> Result<(), SchedulerError> {
        let task = self.tasks.get(name).ok_or_else(|| {
            error!("Task not found: {}", name);
            SchedulerError::UnknownTask(name.to_string())
        })?;

        execute(&task.name, &task.job).await?;
        info!("Manually executed task: {}", name);
        Ok(())
    }

    pub async fn is_running(&self, name: &str) -> bool {
        match self.tasks.get(name) {
            Some(task) => task.is_running().await,
            None => false,
        }
    }

    /// Running flag per task
    pub async fn status(&self) -> BTreeMap<String, bool> {
        let mut status = BTreeMap::new();
        for (name, task) in &self.tasks {
            status.insert(name.clone(), task.is_running().await);
        }
        status
    }

    /// Human-readable cadence per task
    pub fn describe(&self) -> BTreeMap<String, String> {
        self.tasks
            .iter()
            .map(|(name, task)| (name.clone(), task.schedule.to_string()))
            .collect()
    }

    /// Next fire time per task, from the scheduler's clock
    pub fn next_runs(&self) -> BTreeMap<String, Option<DateTime<Utc>>> {
        let now = self.clock.now();
        self.tasks
            .iter()
            .map(|(name, task)| (name.clone(), task.schedule.next_run(now)))
            .collect()
    }

    /// `Error` with nothing running, `Warning` with fewer than half running
    pub async fn health_check(&self, cache_health: HealthReport) -> SchedulerHealth {
        let task_status = self.status().await;
        let active_tasks = task_status.values().filter(|running| **running).count();
        let total_tasks = self.tasks.len();

        let status = if active_tasks == 0 {
            HealthStatus::Error
        } else if active_tasks * 2 < total_tasks {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        SchedulerHealth {
            status,
            active_tasks,
            total_tasks,
            task_status,
            cache_health,
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for task in self.tasks.values_mut() {
            if let Some(handle) = task.handle.get_mut().take() {
                handle.abort();
            }
        }
    }
}

async fn run_loop(name: String, schedule: Schedule, job: Job, clock: Arc<dyn Clock>) {
    loop {
        let Some(delay) = schedule.delay_from(clock.now()) else {
            warn!("Task {} has no upcoming run, stopping", name);
            return;
        };
        tokio::time::sleep(delay).await;

        // Failure is already logged
        let _ = execute(&name, &job).await;
    }
}

/// Run the job on its own task so a panic is contained
async fn execute(name: &str, job: &Job) -> Result<(), SchedulerError> {
    info!("Running task: {}", name);

    match tokio::spawn(job()).await {
        Ok(Ok(())) => {
            info!("Task {} completed", name);
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Task {} failed: {:#}", name, e);
            Err(SchedulerError::JobFailed {
                name: name.to_string(),
                reason: format!("{:#}", e),
            })
        }
        Err(e) => {
            error!("Task {} panicked: {}", name, e);
            Err(SchedulerError::JobFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use finboard_cache::ManualClock;

    #[test]
    fn test_schedule_display() {
        assert_eq!(Schedule::every(Duration::from_secs(1800)).to_string(), "every 30m");
        assert_eq!(Schedule::every(Duration::from_secs(4 * 3600)).to_string(), "every 4h");
        assert_eq!(Schedule::every(Duration::from_secs(90)).to_string(), "every 90s");
        assert_eq!(
            Schedule::cron("0 0 1 * * *").unwrap().to_string(),
            "cron '0 0 1 * * *' (UTC)"
        );
    }

    #[test]
    fn test_invalid_cron() {
        let err = Schedule::cron("not a cron").unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_cron_next_run_skips_weekend() {
        let schedule = Schedule::cron("0 30 0 * * Mon-Fri").unwrap();
        // Saturday
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        assert_eq!(
            schedule.next_run(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 0, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_duplicate_registration() {
        let mut scheduler = TaskScheduler::new();
        scheduler
            .register("a", Schedule::every(Duration::from_secs(1)), || async { Ok(()) })
            .unwrap();
        let err = scheduler
            .register("a", Schedule::every(Duration::from_secs(1)), || async { Ok(()) })
            .unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateTask(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cron_task_fires_at_due_time() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 59, 0).unwrap(),
        ));
        let runs = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let mut scheduler = TaskScheduler::with_clock(clock);
        let counter = runs.clone();
        scheduler
            .register("daily", Schedule::cron("0 0 1 * * *").unwrap(), move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();

        scheduler.start("daily").await;

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
