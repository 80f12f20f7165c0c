//! Error types for flow operations.

use std::fmt;

use pickup_core::ApiError;
use thiserror::Error;

use crate::clipboard::ClipboardError;

/// Which of the Settings screen's two independent reads failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPart {
    Settings,
    Models,
}

impl fmt::Display for LoadPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPart::Settings => f.write_str("settings"),
            LoadPart::Models => f.write_str("model catalog"),
        }
    }
}

/// Errors surfaced by the flows.
///
/// Display is the user-facing text.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Rejected locally; no request was made.
    #[error("{0}")]
    Validation(String),

    /// A backend call failed. `message` is the server's text when it sent
    /// one, otherwise a generic fallback.
    #[error("{message}")]
    Request {
        message: String,
        #[source]
        source: ApiError,
    },

    /// One of two independent reads failed; the other was applied.
    #[error("{part} failed to load: {message}")]
    PartialLoad { part: LoadPart, message: String },

    /// A generation is already in flight.
    #[error("a request is already in progress")]
    Busy,

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

impl FlowError {
    /// Wrap a backend error, preferring the server's message over `fallback`.
    pub fn request(source: ApiError, fallback: &str) -> Self {
        FlowError::Request {
            message: source.user_message(fallback),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        FlowError::Validation(message.into())
    }

    /// The backend error behind this failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            FlowError::Request { source, .. } => Some(source),
            _ => None,
        }
    }
}
