//! Provider quota tracking
//!
//! A [`QuotaTracker`] counts calls per provider within a fixed period and
//! refuses further calls once a provider reaches its limit. It never errors;
//! refusal is the `false` returned from [`QuotaTracker::increment`].

pub mod limits;
pub mod tracker;

pub use limits::{ProviderLimits, DEFAULT_PROVIDER_LIMIT};
pub use tracker::QuotaTracker;
