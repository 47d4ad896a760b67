use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested path does not exist.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A read was requested on something that is not a regular file.
    #[error("Not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// A read exceeded the configured size limit.
    #[error("File too large: {} ({size} bytes, limit {limit})", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Malformed request parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Transport-level HTTP client errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-success response returned by the directory server.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A background task panicked or was cancelled.
    #[error("Task error: {0}")]
    Task(String),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration that cannot be used as given.
    #[error("Config error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status used when this error crosses the request-handler boundary.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::NotAFile(_) => StatusCode::NOT_FOUND,
            AppError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Server { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error means the target path is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound(_) | AppError::NotAFile(_) => true,
            AppError::Server { status, .. } => *status == StatusCode::NOT_FOUND.as_u16(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
