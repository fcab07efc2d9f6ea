//! Application state shared across handlers.

use std::sync::Arc;

use ad_service::{AdBannerService, AdServiceConfig};
use astro_core::Backend;
use astrology_store::AstrologyStore;
use report_export::{ExportConfig, LoggingNotifier, ReportExporter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Ad banners, zones and analytics.
    pub ads: Arc<AdBannerService>,
    backend: Arc<dyn Backend>,
    export: ExportConfig,
}

impl AppState {
    /// Create new application state over one backend.
    pub fn new(backend: Arc<dyn Backend>, ads: AdServiceConfig, export: ExportConfig) -> Self {
        Self {
            ads: Arc::new(AdBannerService::with_config(Arc::clone(&backend), ads)),
            backend,
            export,
        }
    }

    /// A store with its own exporter, for one report request.
    ///
    /// Exporters run one export at a time, so concurrent downloads each get
    /// their own instead of queuing behind a shared one.
    pub fn report_store(&self) -> AstrologyStore {
        let exporter = ReportExporter::from_config(self.export.clone())
            .with_notifier(Arc::new(LoggingNotifier));
        AstrologyStore::with_exporter(Arc::clone(&self.backend), Arc::new(exporter))
    }
}
