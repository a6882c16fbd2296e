//! Error types for the document Q&A system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for lexrag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lexrag errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No extractor is registered for the declared format
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Extractor failed on corrupt or unreadable content
    #[error("Failed to extract '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Generation failed with a retryable status (429 or 5xx)
    #[error("Generation temporarily unavailable (HTTP {status}): {message}")]
    TransientGeneration { status: u16, message: String },

    /// Generation failed in a way retrying will not fix
    #[error("Generation failed: {0}")]
    PermanentGeneration(String),

    /// Generation gave up, either immediately or after the retry budget
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Unknown batch id
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Malformed request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Classify a non-2xx generation response.
    ///
    /// 429 and every 5xx are transient; anything else is permanent.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let message = body.into();
        if status == 429 || status >= 500 {
            Self::TransientGeneration { status, message }
        } else {
            Self::PermanentGeneration(format!("HTTP {}: {}", status, message))
        }
    }

    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientGeneration { .. })
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::UnsupportedFormat(format) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_type",
                format!("Unsupported file type: {}", format),
            ),
            Error::Extraction { filename, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "extraction_error",
                format!("Failed to extract '{}': {}", filename, message),
            ),
            Error::TransientGeneration { .. }
            | Error::PermanentGeneration(_)
            | Error::GenerationUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "generation_error",
                self.to_string(),
            ),
            Error::JobNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Job not found: {}", id),
            ),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
