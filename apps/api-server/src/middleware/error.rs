//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use pulse_core::error::{DomainError, RepoError};
use pulse_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl AppError {
    /// Problem details for this error, without request context.
    pub fn problem(&self) -> ErrorResponse {
        match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            // Internal details stay in the logs.
            AppError::Internal(_) => ErrorResponse::internal_error(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = self {
            tracing::error!("Internal error: {}", detail);
        }

        HttpResponse::build(self.status_code()).json(self.problem())
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Repository(repo) => repo.into(),
            other @ (DomainError::DimensionMismatch { .. }
            | DomainError::EmbeddingUnavailable(_)
            | DomainError::Internal(_)) => AppError::Internal(other.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            other => AppError::Internal(format!("Database error: {other}")),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::ports::EmbeddingError;
    use uuid::Uuid;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let not_found: AppError = DomainError::post_not_found(Uuid::nil()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let invalid: AppError = DomainError::Validation("title must not be empty".into()).into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let unavailable: AppError =
            DomainError::EmbeddingUnavailable(EmbeddingError::Timeout).into();
        assert_eq!(unavailable.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let repo: AppError = DomainError::Repository(RepoError::NotFound).into();
        assert_eq!(repo.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = AppError::Internal("connection reset by peer".to_string());
        let problem = err.problem();

        assert_eq!(problem.status, 500);
        assert!(problem.detail.is_none());
    }
}
