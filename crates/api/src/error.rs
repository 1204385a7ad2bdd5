//! Unified error handling for the HTTP boundary.
//!
//! Provides a unified `AppError` type that maps the domain error taxonomy to
//! HTTP status codes. All route handlers return `Result<T, AppError>`.
//! Internal failures are logged server-side and never leak details to
//! clients.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, CheckoutError, OrderError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout failed.
    #[error("checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Order operation failed.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// Status code and client-safe message for this error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_response(err),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "invalid credentials".to_owned())
                }
                AuthError::TokenExpired | AuthError::TokenInvalid => {
                    (StatusCode::UNAUTHORIZED, err.to_string())
                }
                AuthError::UserAlreadyExists => (
                    StatusCode::BAD_REQUEST,
                    "email already registered".to_owned(),
                ),
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "invalid email address".to_owned())
                }
                AuthError::Inactive => (StatusCode::FORBIDDEN, err.to_string()),
                AuthError::Repository(inner) => repository_response(inner),
                AuthError::PasswordHash => internal(),
            },
            Self::Cart(err) => match err {
                CartError::VariantNotFound | CartError::ItemNotFound => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                CartError::Repository(inner) => repository_response(inner),
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::VariantUnavailable { .. } => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                CheckoutError::InsufficientStock { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                CheckoutError::Repository(inner) => repository_response(inner),
            },
            Self::Order(err) => match err {
                OrderError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                OrderError::Transition(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                OrderError::Repository(inner) => repository_response(inner),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

/// Map a repository error to a response, hiding internal details.
fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned()),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal(),
    }
}

const fn internal() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, String::new())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request error");
            let body = ErrorBody {
                error: "internal server error".to_owned(),
            };
            return (status, Json(body)).into_response();
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_taxonomy_status_codes() {
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::InsufficientStock {
                variant_id: mitienda_core::VariantId::new(1),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Cart(CartError::ItemNotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("staff only".to_owned())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "price column is garbage".to_owned(),
        ));
        let (status, _) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
