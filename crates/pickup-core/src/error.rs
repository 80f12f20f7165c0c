//! Error types for backend calls.

use thiserror::Error;

/// Errors that can occur when talking to the pickup line backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// No response arrived within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Credentials were missing, expired or rejected (HTTP 401).
    #[error("unauthorized: {}", .0.as_deref().unwrap_or("missing or invalid token"))]
    Unauthorized(Option<String>),

    /// The addressed resource does not exist (HTTP 404).
    #[error("not found: {}", .0.as_deref().unwrap_or("no such resource"))]
    NotFound(Option<String>),

    /// Any other non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    Status { status: u16, message: Option<String> },

    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Build an error from a status code and the optional server message.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Status { status, message },
        }
    }

    /// The human-readable message the server attached, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(message) | ApiError::NotFound(message) => message.as_deref(),
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Server message if present, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
