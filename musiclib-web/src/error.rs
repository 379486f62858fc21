//! Error types for musiclib-web
//!
//! Library errors are mapped to HTTP statuses here. Validation failures keep
//! their field map so a client can show messages beside the inputs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use musiclib_common::ValidationErrors;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unsupported upload type (415)
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// musiclib-common error
    #[error(transparent)]
    Common(#[from] musiclib_common::Error),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Common(musiclib_common::Error::Validation(errors))
    }
}

fn message_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal(detail: &dyn std::fmt::Display) -> Response {
    error!("Request failed: {}", detail);
    message_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use musiclib_common::Error as Common;

        match self {
            ApiError::BadRequest(msg) => message_body(StatusCode::BAD_REQUEST, msg),
            ApiError::UnsupportedMediaType(msg) => message_body(StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            ApiError::Io(err) => internal(&err),
            ApiError::Common(err) => match err {
                Common::NotFound(msg) => message_body(StatusCode::NOT_FOUND, msg),
                Common::InvalidInput(msg) => message_body(StatusCode::BAD_REQUEST, msg),
                Common::Conflict(msg) => message_body(StatusCode::CONFLICT, msg),
                Common::Validation(errors) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors }))).into_response()
                }
                other @ (Common::Database(_) | Common::Io(_) | Common::Config(_) | Common::Internal(_)) => {
                    internal(&other)
                }
            },
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
