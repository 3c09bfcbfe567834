//! HTTP error mapping
//!
//! This is the only place store and input errors become status codes. Error
//! responses carry just `{ "error", "code" }`; no partial payload is ever
//! attached.

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use modstats_core::{Error, ErrorResponse};
use tracing::{error, warn};

/// Error returned by every handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Response status
    pub status: StatusCode,
    /// Stable machine-readable code
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
}

/// Handler result alias
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build an error with an explicit status and code
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 for a path id that is not a positive integer
    pub fn malformed_id(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "MALFORMED_ID", message)
    }

    /// 400 for a query parameter that cannot be used
    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "MALFORMED_INPUT", message)
    }

    /// 410 for a snapshot version that has been evicted
    pub fn snapshot_expired(version: u64) -> Self {
        Self::new(
            StatusCode::GONE,
            "SNAPSHOT_EXPIRED",
            format!("Snapshot {version} is no longer available; reload /api/moderators"),
        )
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { resource } => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{resource} not found"))
            }
            Error::MalformedInput { field, message } => {
                Self::malformed_input(format!("{field}: {message}"))
            }
            Error::Validation { field, message } => Self::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("{field}: {message}"),
            ),
            Error::StorageUnavailable { message } => {
                error!("Record store unavailable: {}", message);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_UNAVAILABLE",
                    "Record store unavailable",
                )
            }
            other => {
                error!("Unhandled error: {}", other);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                )
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query string: {}", rejection.body_text());
        Self::malformed_input(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::malformed_input(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message, self.code))).into_response()
    }
}
