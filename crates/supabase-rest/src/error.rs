//! Error types for supabase-rest.

use astro_core::BackendError;
use thiserror::Error;

/// Errors that can occur when talking to a Supabase project.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// PostgREST or edge function error response.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Required environment variable missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

impl From<SupabaseError> for BackendError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Http(e) if e.is_timeout() || e.is_connect() => {
                BackendError::Unavailable(e.to_string())
            }
            SupabaseError::Http(e) => BackendError::Request(e.to_string()),
            SupabaseError::Json(e) => BackendError::Decode(e),
            // 23xxx is the Postgres integrity-constraint class
            SupabaseError::Api { code, message, .. } if code.starts_with("23") => {
                BackendError::Constraint(message)
            }
            SupabaseError::Api { status, message, .. } => BackendError::Status { status, message },
            SupabaseError::NotFound(what) => BackendError::UnknownFunction(what),
            SupabaseError::Config(msg) | SupabaseError::MissingEnvVar(msg) => {
                BackendError::Unavailable(msg)
            }
        }
    }
}
