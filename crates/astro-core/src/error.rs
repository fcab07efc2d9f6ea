//! Error types for backend operations.

use thiserror::Error;

/// Errors that can occur while talking to a row store.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response (connection, timeout, DNS).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A row could not be decoded into the expected model.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An RPC or edge function is not known to the backend.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A write violated a constraint (foreign key, uniqueness).
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The backend is temporarily unavailable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Whether the error means the requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
            || matches!(self, BackendError::Status { status: 404, .. })
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
