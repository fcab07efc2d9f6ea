//! PDF and HTML export for astrology reports.
//!
//! Reports are rendered from data rather than captured from a screen:
//!
//! ```text
//! ReportDocument ──► ReportExporter::export_pdf
//!                        │
//!                        ├─ Capturing
//!                        ├─ RenderingPrimary   (LayoutRenderer: markdown layout on A4 pages)
//!                        │     └─ on error ──► RenderingFallback (PlainTextRenderer)
//!                        └─ Idle               (success, failure, or watchdog timeout)
//! ```
//!
//! The watchdog (20 seconds by default) stops waiting on a render that never
//! finishes, resets the exporter to idle and emits a timeout toast through the
//! configured [`Notifier`]. Layout work already running on a blocking thread
//! is not interrupted; it finishes in the background and is thrown away.
//!
//! # Example
//!
//! ```rust,ignore
//! use report_export::{ReportDocument, ReportExporter};
//!
//! let exporter = ReportExporter::new();
//! let doc = ReportDocument::from_report(&report, Some(&chart));
//! let pdf = exporter.export_pdf(&doc).await?;
//! pdf.save_to("downloads").await?;
//! ```

mod config;
mod document;
mod error;
mod exporter;
mod filename;
mod html;
pub mod layout;
mod notify;
mod pdf;
mod renderer;

pub use config::ExportConfig;
pub use document::ReportDocument;
pub use error::ExportError;
pub use exporter::{ExportPhase, PdfArtifact, ReportExporter};
pub use filename::sanitize_filename;
pub use html::{export_html, render_html, render_html_fragment, HtmlArtifact};
pub use layout::{LayoutLine, PageLayout};
pub use notify::{LoggingNotifier, NoOpNotifier, Notifier, RecordingNotifier, Toast, ToastLevel};
pub use renderer::{LayoutRenderer, PlainTextRenderer, RenderedPdf, Renderer};
