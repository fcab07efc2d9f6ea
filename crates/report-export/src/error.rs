//! Error types for report export.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while exporting a report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The layout renderer could not lay out the document.
    #[error("render failed: {0}")]
    Render(String),

    /// PDF encoding failed.
    #[error("PDF encoding failed: {0}")]
    Pdf(String),

    /// Both the primary and the fallback renderer failed.
    #[error("PDF generation failed (primary: {primary}; fallback: {fallback})")]
    AllRenderersFailed { primary: String, fallback: String },

    /// The watchdog fired before rendering finished.
    #[error("PDF generation timed out after {0:?}")]
    Timeout(Duration),

    /// Another export is already running on this exporter.
    #[error("an export is already in progress")]
    Busy,

    /// HTML template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Writing the output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
