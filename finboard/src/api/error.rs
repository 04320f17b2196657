//! Mapping from application errors to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use finboard_cache::CacheError;
use serde_json::json;
use tracing::error;

use crate::scheduler::SchedulerError;

#[derive(Debug)]
pub enum ApiError {
    /// Provider quota exhausted; the client may retry after the period resets
    RateLimited { provider: String },
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::RateLimitExceeded { provider } => ApiError::RateLimited { provider },
            CacheError::InvalidPattern(e) => ApiError::BadRequest(format!("Invalid pattern: {}", e)),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CacheError>() {
            Ok(cache_err) => cache_err.into(),
            Err(err) => ApiError::Internal(err),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::UnknownTask(name) => ApiError::NotFound(format!("Task not found: {}", name)),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::RateLimited { provider } => {
                let err = CacheError::RateLimitExceeded { provider };
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": err.to_string(),
                        "retryable": err.is_retryable(),
                    })),
                )
                    .into_response()
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(err) => {
                error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": format!("{:#}", err) })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_wrapped_rate_limit() {
        let err: anyhow::Error = CacheError::RateLimitExceeded {
            provider: "openai".to_string(),
        }
        .into();

        match ApiError::from(err) {
            ApiError::RateLimited { provider } => assert_eq!(provider, "openai"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::RateLimited { provider: "x".into() }, StatusCode::TOO_MANY_REQUESTS),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (SchedulerError::UnknownTask("nope".into()).into(), StatusCode::NOT_FOUND),
            (ApiError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
