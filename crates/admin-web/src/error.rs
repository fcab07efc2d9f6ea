//! Error types for the admin web interface.

use ad_service::AdError;
use astrology_store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use report_export::ExportError;
use thiserror::Error;

/// Errors that can occur in the admin web interface.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Ad service error.
    #[error("Ad error: {0}")]
    Ad(#[from] AdError),

    /// Report store error.
    #[error("Report error: {0}")]
    Store(#[from] StoreError),

    /// Page template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Request rejected before reaching a service.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    fn status(&self) -> StatusCode {
        match self {
            AdminError::Ad(AdError::Validation(_)) => StatusCode::BAD_REQUEST,
            AdminError::Ad(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            AdminError::Ad(AdError::Backend(_)) => StatusCode::BAD_GATEWAY,
            AdminError::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            AdminError::Store(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            AdminError::Store(StoreError::Export(ExportError::Busy)) => StatusCode::CONFLICT,
            AdminError::Store(StoreError::Export(ExportError::Timeout(_))) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            AdminError::Store(StoreError::Backend(_)) => StatusCode::BAD_GATEWAY,
            AdminError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for admin operations.
pub type Result<T> = std::result::Result<T, AdminError>;
