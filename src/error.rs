//! Request error taxonomy
//!
//! Every error is terminal for the request; nothing is retried. Variants
//! map one-to-one onto status codes and render the same JSON body shape
//! the rest of the API uses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Missing or empty required field
    Validation(&'static str),

    /// No valid session user on a protected route
    Unauthenticated,

    /// Unknown short code
    NotFound,

    /// Authenticated but not allowed (wrong owner, or bad credentials)
    Forbidden(&'static str),

    /// Session layer or password hashing failure
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, "validation", message.to_string()),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "You must be logged in".to_string(),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                "Short URL not found".to_string(),
            ),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message.to_string()),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": message,
                "code": code
            })),
        )
            .into_response()
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
