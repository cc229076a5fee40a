// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

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
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password does not match")]
    InvalidCredentials,

    #[error("Administrator access required")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Misconfigured destination: {0}")]
    Misconfigured(String),

    #[error("Google Drive error: {0}")]
    Drive(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker carried by `Drive` errors when Google rejects the refresh token.
    pub const INVALID_GRANT: &'static str = "invalid_grant";

    /// Whether this error means the stored refresh token is no longer usable.
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, AppError::Drive(msg) if msg.contains(Self::INVALID_GRANT))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", None)
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                Some(msg.clone()),
            ),
            AppError::Misconfigured(msg) => {
                tracing::error!(error = %msg, "Destination not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "misconfigured_destination",
                    None,
                )
            }
            AppError::Drive(msg) => {
                tracing::error!(error = %msg, "Google Drive error");
                (StatusCode::INTERNAL_SERVER_ERROR, "drive_error", None)
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::UploadFailed(msg) => {
                tracing::error!(error = %msg, "Upload failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "upload_failed", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
