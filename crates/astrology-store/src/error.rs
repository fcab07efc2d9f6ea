//! Error types for the astrology store.

use astro_core::BackendError;
use report_export::ExportError;
use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query, insert, update or delete failed (including not-found).
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// PDF or HTML export failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Input rejected before reaching the backend.
    #[error("invalid input: {0}")]
    Validation(String),

    /// An edge function answered with something we could not use.
    #[error("unexpected response from {function}: {message}")]
    UnexpectedResponse {
        function: &'static str,
        message: String,
    },

    /// Preference file I/O failed.
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Preference file could not be parsed or written.
    #[error("preferences JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the error means a referenced row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Backend(e) if e.is_not_found())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
