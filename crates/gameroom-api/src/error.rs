//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use gameroom_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// How an error body is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    /// Bare message text, used by the relay routes.
    Plain,
}

/// HTTP-facing wrapper around [`AppError`].
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    format: BodyFormat,
}

impl ApiError {
    /// Renders the error as plain text instead of JSON.
    pub fn plain(error: AppError) -> Self {
        Self {
            error,
            format: BodyFormat::Plain,
        }
    }

    /// Underlying domain error.
    pub fn inner(&self) -> &AppError {
        &self.error
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        status_and_code(&self.error.kind).0
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            format: BodyFormat::Json,
        }
    }
}

fn status_and_code(kind: &ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ErrorKind::ExternalService => (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
        ErrorKind::Internal
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Io => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = status_and_code(&self.error.kind);

        if status.is_server_error() {
            tracing::error!(error = %self.error, "Internal server error");
        }

        match self.format {
            BodyFormat::Plain => (status, self.error.message).into_response(),
            BodyFormat::Json => {
                let body = ApiErrorResponse {
                    error: error_code.to_string(),
                    message: self.error.message,
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
