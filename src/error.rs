use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::response::ErrorResponse;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Why an authentication attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// No token was supplied with the request
    Missing,
    /// The supplied token does not match the token format
    Malformed,
    /// The token is well-formed but unknown to the registry
    NotFound,
    /// The token existed but its TTL has elapsed
    Expired,
    /// The token was explicitly revoked or evicted
    Revoked,
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthErrorKind::Missing => write!(f, "missing bearer token"),
            AuthErrorKind::Malformed => write!(f, "malformed token"),
            AuthErrorKind::NotFound => write!(f, "unknown token"),
            AuthErrorKind::Expired => write!(f, "token expired"),
            AuthErrorKind::Revoked => write!(f, "token revoked"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication error: {0}")]
    Auth(AuthErrorKind),

    #[error("daily word quota exceeded")]
    QuotaExceeded {
        current_usage: u64,
        limit: u64,
        reset_at: u64,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::QuotaExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ApiError::Internal(detail) = &self {
            // Caller gets an opaque message; the detail stays in the logs.
            tracing::error!(target: "justifier::error", detail = %detail, "internal error");
        }
        let body = ErrorResponse::from_api_error(&self);
        (status, Json(body)).into_response()
    }
}
