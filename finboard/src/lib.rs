pub mod api;
pub mod config;
pub mod models;
pub mod scheduler;
pub mod sources;
pub mod storage;

pub use api::{ApiError, ApiServer, AppState};
pub use config::AppConfig;
pub use models::{
    EarningsEvent, EarningsTime, EconomicEvent, Importance, MarketSummary, NewsArticle,
    ScrapeReport, SummaryItem,
};
pub use scheduler::{RefreshJobs, Schedule, SchedulerError, SchedulerHealth, TaskScheduler};
pub use sources::{EarningsSource, JsonFileSources, NewsSource, Sources, SummaryGenerator};
pub use storage::FileStore;
