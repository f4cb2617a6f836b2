use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::{DomainError, ErrorKind};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after_secs: u64 },
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Domain(e) => e.code(),
            AppError::BadRequest(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(e) => match (e.kind(), e) {
                (ErrorKind::Validation | ErrorKind::Conflict, _) => StatusCode::BAD_REQUEST,
                (ErrorKind::NotFound, _) => StatusCode::NOT_FOUND,
                (ErrorKind::Transient, DomainError::Internal(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                (ErrorKind::Transient, _) => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut builder = HttpResponse::build(status);
        if let AppError::RateLimited { retry_after_secs } = self {
            builder.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }
        builder.json(serde_json::json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::from(DomainError::OrderNotFound).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_and_conflict_return_400() {
        for e in [
            DomainError::InvalidQuantity,
            DomainError::OrderMustHaveItems,
            DomainError::InsufficientStock,
            DomainError::OnlyPendingCanConfirm,
            DomainError::InvalidIdentifier("abc".to_string()),
        ] {
            assert_eq!(AppError::from(e).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn lock_timeout_returns_503() {
        assert_eq!(
            AppError::from(DomainError::LockTimeout).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(DomainError::Deadlock).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(DomainError::Internal("db down".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_display_is_passed_through() {
        assert_eq!(
            AppError::from(DomainError::InsufficientStock).to_string(),
            "insufficient product quantity"
        );
    }

    #[test]
    fn rate_limited_returns_429_with_retry_after() {
        let err = AppError::RateLimited {
            retry_after_secs: 12,
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            resp.headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("12")
        );
        assert_eq!(err.code(), "RATE_LIMIT_EXCEEDED");
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            AppError::from(DomainError::InsufficientStock).code(),
            "INSUFFICIENT_STOCK"
        );
        assert_eq!(AppError::BadRequest("x".to_string()).code(), "VALIDATION_ERROR");
    }
}
