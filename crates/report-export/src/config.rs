//! Export configuration.

use std::env;
use std::time::Duration;

/// Tuning for the PDF pipeline.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Hard cutoff for one export, after which the exporter resets to idle.
    pub watchdog: Duration,
    /// Lines per page in the plain-text fallback.
    pub fallback_lines_per_page: usize,
    /// Wrap width (characters) in the plain-text fallback.
    pub fallback_wrap_width: usize,
    /// Body font size (points) in the primary layout.
    pub body_font_size: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            watchdog: Duration::from_secs(20),
            fallback_lines_per_page: 50,
            fallback_wrap_width: 90,
            body_font_size: 11.0,
        }
    }
}

impl ExportConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `PDF_WATCHDOG_SECS` - Watchdog cutoff (default: 20)
    /// - `PDF_FALLBACK_LINES_PER_PAGE` - Fallback lines per page (default: 50)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let watchdog = env::var("PDF_WATCHDOG_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.watchdog);

        let fallback_lines_per_page = env::var("PDF_FALLBACK_LINES_PER_PAGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.fallback_lines_per_page);

        Self {
            watchdog,
            fallback_lines_per_page,
            ..defaults
        }
    }

    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }
}
