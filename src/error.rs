// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Media host error: {0}")]
    Media(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error envelope:
/// `{statusCode, message, errors: [], data: null, success: false}`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    status_code: u16,
    message: String,
    errors: Vec<String>,
    data: Option<()>,
    success: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired".to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Media(msg) => {
                tracing::error!(error = %msg, "Media host error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorEnvelope {
            status_code: status.as_u16(),
            message,
            errors: vec![],
            data: None,
            success: false,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                AppError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Unauthorized("no".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                AppError::Database("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_internal_error_hides_details() {
        let envelope = ErrorEnvelope {
            status_code: 500,
            message: "Internal server error".to_string(),
            errors: vec![],
            data: None,
            success: false,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["statusCode"], 500);
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
        assert_eq!(json["errors"].as_array().unwrap().len(), 0);
    }
}
