//! Error types for the taskboard engine

use serde::Serialize;
use thiserror::Error;

/// Result type for taskboard operations
pub type Result<T> = std::result::Result<T, TaskboardError>;

/// Coarse classification used by the UI to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed input. Never retried.
    Validation,
    /// The entity does not exist (any more).
    NotFound,
    /// Network or storage failure.
    Persistence,
}

/// Errors that can occur in taskboard operations
#[derive(Debug, Error)]
pub enum TaskboardError {
    /// Missing required field
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Identifier is not in a usable format
    #[error("invalid {kind} id: {id:?}")]
    InvalidId { kind: &'static str, id: String },

    /// Validation failure reported by the server
    #[error("rejected: {message}")]
    Validation { message: String },

    /// Board not found
    #[error("board not found: {id}")]
    BoardNotFound { id: String },

    /// Column not found
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// Card not found
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Generic resource not found (server responses without a known noun)
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Server answered with an unexpected status
    #[error("server error {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Lock is held by another process
    #[error("lock busy - another operation in progress")]
    LockBusy,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for TaskboardError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl TaskboardError {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::InvalidValue { .. }
            | Self::InvalidId { .. }
            | Self::Validation { .. } => ErrorKind::Validation,
            Self::BoardNotFound { .. }
            | Self::ColumnNotFound { .. }
            | Self::CardNotFound { .. }
            | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Api { .. }
            | Self::Http(_)
            | Self::LockBusy
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_) => ErrorKind::Persistence,
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
