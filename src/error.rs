//! Error types and handling for the weather journal

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Main error type for the weather journal
#[derive(Error, Debug)]
pub enum JournalError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Failures talking to Open-Meteo, Nominatim or the journal API
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Missing record or unknown location
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Query store errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl JournalError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            JournalError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            JournalError::Api { message } => message.clone(),
            JournalError::Validation { message } => format!("Invalid input: {message}"),
            JournalError::NotFound { message } => message.clone(),
            JournalError::Storage { .. } => {
                "Could not read or write the query journal.".to_string()
            }
            JournalError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// HTTP status used when this error crosses the journal API
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            JournalError::Validation { .. } => StatusCode::BAD_REQUEST,
            JournalError::NotFound { .. } => StatusCode::NOT_FOUND,
            JournalError::Api { .. } => StatusCode::BAD_GATEWAY,
            JournalError::Config { .. }
            | JournalError::Storage { .. }
            | JournalError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `detail` field of an error response
    fn detail(&self) -> String {
        match self {
            JournalError::Validation { message }
            | JournalError::NotFound { message }
            | JournalError::Api { message } => message.clone(),
            other => other.user_message(),
        }
    }
}

impl From<fjall::Error> for JournalError {
    fn from(err: fjall::Error) -> Self {
        JournalError::storage(err.to_string())
    }
}

impl From<postcard::Error> for JournalError {
    fn from(err: postcard::Error) -> Self {
        JournalError::storage(format!("corrupt record: {err}"))
    }
}

impl From<reqwest::Error> for JournalError {
    fn from(err: reqwest::Error) -> Self {
        JournalError::api(format!("Request failed: {err}"))
    }
}

impl From<JsonRejection> for JournalError {
    fn from(rejection: JsonRejection) -> Self {
        JournalError::validation(rejection.body_text())
    }
}

impl IntoResponse for JournalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
