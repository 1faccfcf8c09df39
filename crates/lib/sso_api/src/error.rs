//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sso_core::AuthError;
use thiserror::Error;
use tracing::error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::BadGateway(m) => (StatusCode::BAD_GATEWAY, "bad_gateway", m.as_str()),
            AppError::Internal(m) => {
                error!(error = %m, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(_) | AuthError::InvalidRole(_) | AuthError::InvalidState => {
                AppError::Validation(e.to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::AccountInactive => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::NotAuthorized(denial) => AppError::Forbidden(denial.to_string()),
            AuthError::UserNotFound | AuthError::ProviderNotConfigured(_) => {
                AppError::NotFound(e.to_string())
            }
            AuthError::UserExists => AppError::Conflict(e.to_string()),
            AuthError::FederationExchangeFailed(_) | AuthError::FederationProfileUnavailable(_) => {
                AppError::BadGateway(e.to_string())
            }
            AuthError::Store(_) | AuthError::Internal(_) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use sso_core::policy::Denial;

    use super::*;

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidRole("root".into()), StatusCode::BAD_REQUEST),
            (AuthError::InvalidState, StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::AccountInactive, StatusCode::UNAUTHORIZED),
            (
                AuthError::NotAuthorized(Denial::SelfDeletion),
                StatusCode::FORBIDDEN,
            ),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (AuthError::UserExists, StatusCode::CONFLICT),
            (
                AuthError::FederationExchangeFailed("HTTP 400".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (AuthError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = AppError::from(AuthError::Internal("db password=hunter2".into()));
        let AppError::Internal(detail) = &err else {
            panic!("expected internal error");
        };
        assert!(detail.contains("hunter2"));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
