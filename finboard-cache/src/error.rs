//! Error types for cache operations
//!
//! Compute failures are not represented here: `CacheService::get_or_set`
//! hands the caller's own error back untouched.

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Provider quota for the current period is exhausted
    #[error("API rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Key pattern is not a valid regular expression
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Whether the caller should back off and retry later rather than treat
    /// this as a hard failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CacheError::RateLimitExceeded { .. })
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;
