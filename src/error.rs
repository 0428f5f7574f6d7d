//! Error types for the website analyzer service.
//!
//! This module provides structured error handling with:
//! - `FetchError`: Failures retrieving the target page (always fatal for a request)
//! - `AppError`: Domain-specific errors for analysis operations
//! - `ApiError`: Wrapper that renders an `AppError` as an HTTP response
//! - `Result<T>`: Type alias for Results using AppError

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// FETCH ERROR TYPE
// ============================================================================

/// Reasons the target page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to reach {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not an HTML document (content-type: {content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Classify a transport error from the HTTP client.
    pub fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { url: url.to_string() }
        } else {
            Self::Unreachable {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for analysis operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The page itself could not be fetched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The analysis worker failed unexpectedly
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create an invalid URL error
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::Fetch(_) => "fetch_failed",
            Self::Internal(_) | Self::Other(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Self::Fetch(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

// ============================================================================
// API ERROR (FOR HTTP HANDLERS)
// ============================================================================

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code (`invalid_url`, `fetch_failed`, `internal_error`)
    pub error: String,
    /// Human-readable description
    pub message: String,
}

/// Wrapper for errors returned from HTTP handlers.
/// Renders as a JSON `ErrorBody` with a matching status code.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl std::error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = ErrorBody {
            error: self.0.code().to_string(),
            message: format!("{:#}", self.0),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_maps_to_bad_request() {
        let err = AppError::invalid_url("not a url");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_url");
    }

    #[test]
    fn fetch_errors_map_to_bad_gateway() {
        let err: AppError = FetchError::Status {
            url: "https://example.com/".into(),
            status: 404,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "fetch_failed");
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn api_error_renders_status() {
        let response = ApiError(AppError::internal("worker panicked")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
