//! The PDF export state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::document::ReportDocument;
use crate::error::ExportError;
use crate::filename::sanitize_filename;
use crate::layout::PageLayout;
use crate::notify::{LoggingNotifier, Notifier, Toast};
use crate::renderer::{LayoutRenderer, PlainTextRenderer, RenderedPdf, Renderer};

/// Where an export currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Capturing,
    RenderingPrimary,
    RenderingFallback,
}

/// A finished PDF ready to be downloaded or written out.
#[derive(Debug, Clone)]
pub struct PdfArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
    /// Text placed on each page, as encoded into `bytes`.
    pub layout: Vec<PageLayout>,
    /// True when the plain-text fallback produced the file.
    pub degraded: bool,
    pub renderer: &'static str,
}

impl PdfArtifact {
    /// First text line of the first page.
    pub fn first_line(&self) -> Option<&str> {
        self.layout
            .first()
            .and_then(|page| page.lines.first())
            .map(|line| line.text.as_str())
    }

    /// Write the file into `dir`, creating it if needed.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// Runs one export at a time with a primary renderer, a fallback, and a watchdog.
pub struct ReportExporter {
    primary: Arc<dyn Renderer>,
    fallback: Arc<dyn Renderer>,
    notifier: Arc<dyn Notifier>,
    config: ExportConfig,
    phase: watch::Sender<ExportPhase>,
}

/// Resets the phase to idle however the export ends, including cancellation.
struct IdleOnDrop<'a>(&'a watch::Sender<ExportPhase>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(ExportPhase::Idle);
    }
}

impl ReportExporter {
    /// Layout renderer with plain-text fallback, default configuration, logged toasts.
    pub fn new() -> Self {
        Self::from_config(ExportConfig::default())
    }

    pub fn from_config(config: ExportConfig) -> Self {
        let (phase, _) = watch::channel(ExportPhase::Idle);
        Self {
            primary: Arc::new(LayoutRenderer::new(&config)),
            fallback: Arc::new(PlainTextRenderer::new(&config)),
            notifier: Arc::new(LoggingNotifier),
            config,
            phase,
        }
    }

    pub fn with_renderers(
        mut self,
        primary: Arc<dyn Renderer>,
        fallback: Arc<dyn Renderer>,
    ) -> Self {
        self.primary = primary;
        self.fallback = fallback;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn phase(&self) -> ExportPhase {
        *self.phase.borrow()
    }

    pub fn is_exporting(&self) -> bool {
        self.phase() != ExportPhase::Idle
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<ExportPhase> {
        self.phase.subscribe()
    }

    /// Export a document to PDF.
    ///
    /// The primary renderer runs first; any error from it switches to the
    /// fallback. If the watchdog fires first, the export stops waiting on
    /// the render, returns to idle and raises a timeout toast. A render
    /// already handed to a blocking thread keeps running there and its
    /// result is discarded.
    pub async fn export_pdf(&self, doc: &ReportDocument) -> Result<PdfArtifact, ExportError> {
        let claimed = self.phase.send_if_modified(|phase| {
            if *phase == ExportPhase::Idle {
                *phase = ExportPhase::Capturing;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(ExportError::Busy);
        }
        let _idle = IdleOnDrop(&self.phase);

        let filename = sanitize_filename(&doc.title, "pdf");
        info!(title = %doc.title, filename = %filename, "Starting PDF export");

        match tokio::time::timeout(self.config.watchdog, self.render_with_fallback(doc)).await {
            Ok(Ok((rendered, degraded))) => {
                let artifact = PdfArtifact {
                    filename,
                    pages: rendered.page_count(),
                    bytes: rendered.bytes,
                    layout: rendered.pages,
                    degraded,
                    renderer: rendered.renderer,
                };
                info!(
                    filename = %artifact.filename,
                    pages = artifact.pages,
                    bytes = artifact.bytes.len(),
                    degraded,
                    "PDF export complete"
                );
                let toast = if degraded {
                    Toast::warning(
                        "PDF exported",
                        format!("{} was exported in simplified format.", artifact.filename),
                    )
                } else {
                    Toast::success(
                        "PDF exported",
                        format!("{} is ready to download.", artifact.filename),
                    )
                };
                self.notifier.notify(toast);
                Ok(artifact)
            }
            Ok(Err(e)) => {
                self.phase.send_replace(ExportPhase::Idle);
                warn!(error = %e, "PDF export failed");
                self.notifier.notify(Toast::error(
                    "PDF export failed",
                    "Could not generate the PDF. Please try again.",
                ));
                Err(e)
            }
            Err(_) => {
                self.phase.send_replace(ExportPhase::Idle);
                warn!(watchdog = ?self.config.watchdog, "PDF export timed out");
                self.notifier.notify(Toast::error(
                    "PDF export timed out",
                    "PDF generation is taking too long. Please try again.",
                ));
                Err(ExportError::Timeout(self.config.watchdog))
            }
        }
    }

    async fn render_with_fallback(
        &self,
        doc: &ReportDocument,
    ) -> Result<(RenderedPdf, bool), ExportError> {
        self.phase.send_replace(ExportPhase::RenderingPrimary);
        let primary_err = match self.primary.render(doc).await {
            Ok(rendered) => return Ok((rendered, false)),
            Err(e) => e,
        };

        warn!(
            renderer = self.primary.name(),
            error = %primary_err,
            "Primary renderer failed, using {}",
            self.fallback.name()
        );
        self.phase.send_replace(ExportPhase::RenderingFallback);

        match self.fallback.render(doc).await {
            Ok(rendered) => Ok((rendered, true)),
            Err(fallback_err) => Err(ExportError::AllRenderersFailed {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            }),
        }
    }
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReportExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportExporter")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .field("phase", &self.phase())
            .field("watchdog", &self.config.watchdog)
            .finish()
    }
}
