//! Report downloads.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::error::{AdminError, Result};
use crate::state::AppState;

fn attachment(
    content_type: &'static str,
    filename: &str,
    body: impl Into<Body>,
) -> Result<Response> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| AdminError::Internal(format!("invalid download name: {}", e)))?;
    let body: Body = body.into();

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Render a report to PDF and send it as a download.
pub async fn report_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let pdf = state.report_store().export_report_to_pdf(&id).await?;
    info!(report_id = %id, pages = pdf.pages, degraded = pdf.degraded, "Serving PDF");
    attachment("application/pdf", &pdf.filename, pdf.bytes)
}

/// Render a report to a standalone HTML page and send it as a download.
pub async fn report_html(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let html = state.report_store().export_report_to_html(&id).await?;
    attachment("text/html; charset=utf-8", &html.filename, html.html)
}
