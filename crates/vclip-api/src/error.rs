//! API error types (§7): orchestrator error kinds translated to HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use vclip_core::OrchestratorError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Queue overflow: {pending} pending, limit {limit}")]
    QueueOverflow { pending: u64, limit: u64 },

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::QueueOverflow { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// §7 propagation policy: `NotFound`/`InvalidState`/`Validation`/`Conflict`/
/// `QueueOverflow` surface to the caller with specific status codes;
/// everything else (storage/db/bus failure) becomes an opaque 500.
impl From<OrchestratorError> for ApiError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::NotFound => ApiError::NotFound("entity not found".to_string()),
            OrchestratorError::InvalidState { current, attempted } => {
                ApiError::Conflict(format!("cannot move from {current} to {attempted}"))
            }
            OrchestratorError::Validation(msg) => ApiError::Validation(msg),
            OrchestratorError::Conflict(msg) => ApiError::Conflict(msg),
            OrchestratorError::QueueOverflow { pending, limit } => ApiError::QueueOverflow { pending, limit },
            OrchestratorError::StorageQuotaExceeded(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production.
        let detail = match &self {
            ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse { detail, code: None };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestrator_not_found_becomes_404() {
        let err = ApiError::from(OrchestratorError::NotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn orchestrator_invalid_state_becomes_409_conflict() {
        let err = ApiError::from(OrchestratorError::invalid_state("queued", "ready"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn orchestrator_validation_becomes_400() {
        let err = ApiError::from(OrchestratorError::validation("bad segments"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn orchestrator_queue_overflow_becomes_429() {
        let err = ApiError::from(OrchestratorError::queue_overflow(10, 10));
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn orchestrator_storage_quota_becomes_400_bad_request() {
        let err = ApiError::from(OrchestratorError::StorageQuotaExceeded("disk full".to_string()));
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn unmapped_orchestrator_errors_become_500() {
        let err = ApiError::from(OrchestratorError::BusUnavailable("redis down".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
