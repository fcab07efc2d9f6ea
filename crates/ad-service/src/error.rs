//! Error types for the ad service.

use astro_core::BackendError;
use thiserror::Error;

/// Errors that can occur in ad service operations.
#[derive(Debug, Error)]
pub enum AdError {
    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Input rejected before reaching the backend.
    #[error("invalid ad input: {0}")]
    Validation(String),
}

impl AdError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdError::Backend(e) if e.is_not_found())
    }
}

/// Result type for ad service operations.
pub type Result<T> = std::result::Result<T, AdError>;
