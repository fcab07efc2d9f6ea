//! The astrology store: collections, report generation, exports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use astro_core::{
    functions, table, tables, AstrologyReport, Backend, BirthChart, ChartData, CompatibilityReport,
    NewBirthChart, NewReport, Query, ReportTemplate, ReportType, TemplateCategory,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use report_export::{export_html, HtmlArtifact, PdfArtifact, ReportDocument, ReportExporter};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::chart::generate_chart_data;
use crate::compatibility::{self, CompatibilityAnalysis};
use crate::content::{self, PLACEHOLDER_CONTENT};
use crate::error::{Result, StoreError};
use crate::state::{AstrologyState, Collection};

/// Overrides for template-based report generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Report title; defaults to "{template} - {chart name}".
    pub title: Option<String>,
    /// Premium flag; defaults to the template's.
    pub is_premium: Option<bool>,
}

#[derive(Serialize)]
struct BirthChartInsert<'a> {
    #[serde(flatten)]
    input: &'a NewBirthChart,
    chart_data: &'a ChartData,
}

#[derive(Serialize)]
struct ContentUpdate<'a> {
    content: &'a str,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CompatibilityInsert<'a> {
    user_id: &'a str,
    chart1_id: &'a str,
    chart2_id: &'a str,
    compatibility_score: f64,
    summary: &'a str,
}

/// Per-collection request counters; only the newest request may write state.
#[derive(Debug, Default)]
struct FetchSequence([AtomicU64; 5]);

impl FetchSequence {
    fn begin(&self, collection: Collection) -> u64 {
        self.0[collection.index()].fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, collection: Collection, ticket: u64) -> bool {
        self.0[collection.index()].load(Ordering::SeqCst) == ticket
    }
}

/// Single source of truth for one user's charts and reports.
///
/// Every operation returns a typed result. Failures are also recorded as a
/// string on the matching error slot of [`AstrologyState`] so a UI can show
/// them without holding on to the error.
pub struct AstrologyStore {
    backend: Arc<dyn Backend>,
    exporter: Arc<ReportExporter>,
    state: RwLock<AstrologyState>,
    sequence: FetchSequence,
    rng: Mutex<StdRng>,
}

impl AstrologyStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_exporter(backend, Arc::new(ReportExporter::new()))
    }

    pub fn with_exporter(backend: Arc<dyn Backend>, exporter: Arc<ReportExporter>) -> Self {
        Self {
            backend,
            exporter,
            state: RwLock::new(AstrologyState::default()),
            sequence: FetchSequence::default(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fix the chart generator seed.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn exporter(&self) -> &Arc<ReportExporter> {
        &self.exporter
    }

    /// Clone of the current state.
    pub async fn state(&self) -> AstrologyState {
        self.state.read().await.clone()
    }

    pub async fn clear_errors(&self) {
        self.state.write().await.clear_errors();
    }

    // -----------------------------------------------------------------------
    // Fetches
    // -----------------------------------------------------------------------

    async fn fetch_collection<T, F>(
        &self,
        collection: Collection,
        query: Query,
        apply: F,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Clone,
        F: FnOnce(&mut AstrologyState, Vec<T>),
    {
        let ticket = self.sequence.begin(collection);
        *self.state.write().await.status_mut(collection).0 = true;

        let result = table::fetch_all::<T>(self.backend.as_ref(), &query).await;

        let mut state = self.state.write().await;
        if !self.sequence.is_current(collection, ticket) {
            debug!(collection = collection.as_str(), ticket, "Discarding superseded response");
            return result.map_err(StoreError::from);
        }

        let (loading, error_slot) = state.status_mut(collection);
        *loading = false;
        match result {
            Ok(rows) => {
                *error_slot = None;
                debug!(collection = collection.as_str(), count = rows.len(), "Fetched");
                apply(&mut *state, rows.clone());
                Ok(rows)
            }
            Err(e) => {
                error!(collection = collection.as_str(), error = %e, "Fetch failed");
                *error_slot = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn user_query(table_name: &str, user_id: &str) -> Query {
        Query::table(table_name)
            .eq("user_id", user_id)
            .order_desc("created_at")
    }

    pub async fn fetch_birth_charts(&self, user_id: &str) -> Result<Vec<BirthChart>> {
        let query = Self::user_query(tables::BIRTH_CHARTS, user_id);
        self.fetch_collection(Collection::BirthCharts, query, |state, rows| {
            state.birth_charts = rows;
        })
        .await
    }

    pub async fn fetch_reports(&self, user_id: &str) -> Result<Vec<AstrologyReport>> {
        let query = Self::user_query(tables::ASTROLOGY_REPORTS, user_id);
        self.fetch_collection(Collection::Reports, query, |state, rows| {
            state.reports = rows;
        })
        .await
    }

    pub async fn fetch_compatibility_reports(
        &self,
        user_id: &str,
    ) -> Result<Vec<CompatibilityReport>> {
        let query = Self::user_query(tables::COMPATIBILITY_REPORTS, user_id);
        self.fetch_collection(Collection::CompatibilityReports, query, |state, rows| {
            state.compatibility_reports = rows;
        })
        .await
    }

    /// Active templates, by name.
    pub async fn fetch_templates(&self) -> Result<Vec<ReportTemplate>> {
        let query = Query::table(tables::REPORT_TEMPLATES)
            .eq("is_active", true)
            .order_asc("name");
        self.fetch_collection(Collection::Templates, query, |state, rows| {
            state.templates = rows;
        })
        .await
    }

    pub async fn fetch_template_categories(&self) -> Result<Vec<TemplateCategory>> {
        let query = Query::table(tables::TEMPLATE_CATEGORIES).order_asc("sort_order");
        self.fetch_collection(Collection::TemplateCategories, query, |state, rows| {
            state.template_categories = rows;
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Birth charts
    // -----------------------------------------------------------------------

    pub async fn create_birth_chart(&self, input: NewBirthChart) -> Result<BirthChart> {
        if input.name.trim().is_empty() {
            return Err(StoreError::Validation("chart name is required".into()));
        }
        if input.user_id.trim().is_empty() {
            return Err(StoreError::Validation("user id is required".into()));
        }

        let chart_data = {
            let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
            generate_chart_data(&mut *rng)
        };
        let payload = BirthChartInsert {
            input: &input,
            chart_data: &chart_data,
        };

        let backend = self.backend.as_ref();
        match table::insert_row::<_, BirthChart>(backend, tables::BIRTH_CHARTS, &payload).await {
            Ok(chart) => {
                info!(chart_id = %chart.id, name = %chart.name, "Created birth chart");
                let mut state = self.state.write().await;
                state.birth_charts.insert(0, chart.clone());
                state.current_chart = Some(chart.clone());
                Ok(chart)
            }
            Err(e) => Err(self
                .record(Collection::BirthCharts, "create birth chart", e.into())
                .await),
        }
    }

    /// Delete a chart. Reports attached to it go with it.
    pub async fn delete_birth_chart(&self, chart_id: &str) -> Result<()> {
        let deleted =
            table::delete_by_id(self.backend.as_ref(), tables::BIRTH_CHARTS, "BirthChart", chart_id)
                .await;
        if let Err(e) = deleted {
            return Err(self.record(Collection::BirthCharts, "delete birth chart", e.into()).await);
        }

        info!(chart_id, "Deleted birth chart");
        let mut state = self.state.write().await;
        state.birth_charts.retain(|c| c.id != chart_id);
        state.reports.retain(|r| r.birth_chart_id != chart_id);
        state
            .compatibility_reports
            .retain(|r| r.chart1_id != chart_id && r.chart2_id != chart_id);
        if state.current_chart.as_ref().is_some_and(|c| c.id == chart_id) {
            state.current_chart = None;
        }
        Ok(())
    }

    /// Select a chart, loading it from the backend if it is not held locally.
    pub async fn set_current_chart(&self, chart_id: &str) -> Result<BirthChart> {
        let chart = self.load_chart(chart_id).await?;
        self.state.write().await.current_chart = Some(chart.clone());
        Ok(chart)
    }

    async fn load_chart(&self, chart_id: &str) -> Result<BirthChart> {
        let local = self
            .state
            .read()
            .await
            .birth_charts
            .iter()
            .find(|c| c.id == chart_id)
            .cloned();
        match local {
            Some(chart) => Ok(chart),
            None => Ok(table::fetch_by_id(
                self.backend.as_ref(),
                tables::BIRTH_CHARTS,
                "BirthChart",
                chart_id,
            )
            .await?),
        }
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Generate a report from a template's ordered sections.
    pub async fn create_report_from_template(
        &self,
        template_id: &str,
        birth_chart_id: &str,
        user_id: &str,
        options: ReportOptions,
    ) -> Result<AstrologyReport> {
        let result: Result<AstrologyReport> = async {
            let template: ReportTemplate = table::fetch_by_id(
                self.backend.as_ref(),
                tables::REPORT_TEMPLATES,
                "ReportTemplate",
                template_id,
            )
            .await?;
            let chart: BirthChart = table::fetch_by_id(
                self.backend.as_ref(),
                tables::BIRTH_CHARTS,
                "BirthChart",
                birth_chart_id,
            )
            .await?;

            let title = options
                .title
                .clone()
                .unwrap_or_else(|| format!("{} - {}", template.name, chart.name));
            let placeholder = NewReport {
                title: title.clone(),
                report_type: template.report_type,
                birth_chart_id: chart.id.clone(),
                user_id: user_id.to_string(),
                content: PLACEHOLDER_CONTENT.to_string(),
                is_premium: options.is_premium.unwrap_or(template.is_premium),
                template_id: Some(template.id.clone()),
            };

            self.insert_then_fill(placeholder, |_| {
                content::template_content(&template, &chart, &title)
            })
            .await
        }
        .await;

        self.finish_report(result, "create report from template").await
    }

    pub async fn create_natal_chart_report(
        &self,
        birth_chart_id: &str,
        user_id: &str,
    ) -> Result<AstrologyReport> {
        let result: Result<AstrologyReport> = async {
            let chart = self.load_chart(birth_chart_id).await?;
            let placeholder = NewReport {
                title: format!("{} Natal Chart", chart.name),
                report_type: ReportType::Natal,
                birth_chart_id: chart.id.clone(),
                user_id: user_id.to_string(),
                content: PLACEHOLDER_CONTENT.to_string(),
                is_premium: false,
                template_id: None,
            };
            self.insert_then_fill(placeholder, |report| {
                content::natal_content(&chart, &report.title)
            })
            .await
        }
        .await;

        self.finish_report(result, "create natal chart report").await
    }

    pub async fn create_vedic_report(
        &self,
        birth_chart_id: &str,
        user_id: &str,
    ) -> Result<AstrologyReport> {
        let result: Result<AstrologyReport> = async {
            let chart = self.load_chart(birth_chart_id).await?;
            let placeholder = NewReport {
                title: format!("{} Vedic Chart", chart.name),
                report_type: ReportType::Vedic,
                birth_chart_id: chart.id.clone(),
                user_id: user_id.to_string(),
                content: PLACEHOLDER_CONTENT.to_string(),
                is_premium: true,
                template_id: None,
            };
            self.insert_then_fill(placeholder, |report| {
                content::vedic_content(&chart, &report.title)
            })
            .await
        }
        .await;

        self.finish_report(result, "create vedic report").await
    }

    /// Insert a placeholder row, build its content, then write the content.
    ///
    /// If the content update fails the placeholder row is removed again.
    async fn insert_then_fill<F>(&self, placeholder: NewReport, build: F) -> Result<AstrologyReport>
    where
        F: FnOnce(&AstrologyReport) -> String,
    {
        let backend = self.backend.as_ref();
        let inserted: AstrologyReport =
            table::insert_row(backend, tables::ASTROLOGY_REPORTS, &placeholder).await?;
        debug!(report_id = %inserted.id, "Inserted placeholder report");

        let body = build(&inserted);
        let patch = ContentUpdate {
            content: &body,
            updated_at: Utc::now(),
        };

        let id = inserted.id.as_str();
        match table::update_by_id(backend, tables::ASTROLOGY_REPORTS, "AstrologyReport", id, &patch)
            .await
        {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!(report_id = id, error = %e, "Content update failed, removing placeholder");
                if let Err(cleanup) =
                    table::delete_by_id(backend, tables::ASTROLOGY_REPORTS, "AstrologyReport", id)
                        .await
                {
                    error!(report_id = id, error = %cleanup, "Could not remove placeholder report");
                }
                Err(e.into())
            }
        }
    }

    async fn finish_report(
        &self,
        result: Result<AstrologyReport>,
        action: &'static str,
    ) -> Result<AstrologyReport> {
        match result {
            Ok(report) => {
                info!(
                    report_id = %report.id,
                    report_type = report.report_type.as_str(),
                    "Created report"
                );
                self.state.write().await.reports.insert(0, report.clone());
                Ok(report)
            }
            Err(e) => Err(self.record(Collection::Reports, action, e).await),
        }
    }

    pub async fn delete_report(&self, report_id: &str) -> Result<()> {
        let backend = self.backend.as_ref();
        if let Err(e) =
            table::delete_by_id(backend, tables::ASTROLOGY_REPORTS, "AstrologyReport", report_id)
                .await
        {
            return Err(self.record(Collection::Reports, "delete report", e.into()).await);
        }
        info!(report_id, "Deleted report");
        self.state.write().await.reports.retain(|r| r.id != report_id);
        Ok(())
    }

    /// Load a report row, preferring the local copy.
    pub async fn get_report(&self, report_id: &str) -> Result<AstrologyReport> {
        let local = self
            .state
            .read()
            .await
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .cloned();
        match local {
            Some(report) => Ok(report),
            None => Ok(table::fetch_by_id(
                self.backend.as_ref(),
                tables::ASTROLOGY_REPORTS,
                "AstrologyReport",
                report_id,
            )
            .await?),
        }
    }

    // -----------------------------------------------------------------------
    // Compatibility
    // -----------------------------------------------------------------------

    /// Score two charts and store the result.
    pub async fn create_compatibility_report(
        &self,
        user_id: &str,
        chart1_id: &str,
        chart2_id: &str,
    ) -> Result<CompatibilityReport> {
        if chart1_id == chart2_id {
            return Err(StoreError::Validation("select two different charts".into()));
        }

        let result: Result<CompatibilityReport> = async {
            let first = self.load_chart(chart1_id).await?;
            let second = self.load_chart(chart2_id).await?;
            let score = compatibility::compatibility_score(&first.chart_data, &second.chart_data);
            let payload = CompatibilityInsert {
                user_id,
                chart1_id: &first.id,
                chart2_id: &second.id,
                compatibility_score: score,
                summary: compatibility::summary(score),
            };
            let backend = self.backend.as_ref();
            Ok(table::insert_row(backend, tables::COMPATIBILITY_REPORTS, &payload).await?)
        }
        .await;

        match result {
            Ok(report) => {
                info!(
                    report_id = %report.id,
                    score = report.compatibility_score,
                    "Created compatibility report"
                );
                self.state.write().await.compatibility_reports.insert(0, report.clone());
                Ok(report)
            }
            Err(e) => Err(self
                .record(Collection::CompatibilityReports, "create compatibility report", e)
                .await),
        }
    }

    /// Detailed comparison of two charts. Not persisted.
    pub async fn analyze_compatibility(
        &self,
        chart1_id: &str,
        chart2_id: &str,
    ) -> Result<CompatibilityAnalysis> {
        let first = self.load_chart(chart1_id).await?;
        let second = self.load_chart(chart2_id).await?;
        Ok(compatibility::analyze(&first.chart_data, &second.chart_data))
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    async fn report_document(&self, report_id: &str) -> Result<ReportDocument> {
        let report = self.get_report(report_id).await?;
        let chart = match self.load_chart(&report.birth_chart_id).await {
            Ok(chart) => Some(chart),
            Err(e) if e.is_not_found() => {
                warn!(
                    report_id,
                    chart_id = %report.birth_chart_id,
                    "Report chart missing, exporting without it"
                );
                None
            }
            Err(e) => return Err(e),
        };
        Ok(ReportDocument::from_report(&report, chart.as_ref()))
    }

    /// Render a report to PDF, tracking `pdf_exporting`/`pdf_error`.
    pub async fn export_report_to_pdf(&self, report_id: &str) -> Result<PdfArtifact> {
        {
            let mut state = self.state.write().await;
            state.pdf_exporting = true;
            state.pdf_error = None;
        }

        let result: Result<PdfArtifact> = async {
            let doc = self.report_document(report_id).await?;
            Ok(self.exporter.export_pdf(&doc).await?)
        }
        .await;

        let mut state = self.state.write().await;
        state.pdf_exporting = false;
        if let Err(e) = &result {
            error!(report_id, error = %e, "PDF export failed");
            state.pdf_error = Some(e.to_string());
        }
        result
    }

    pub async fn export_report_to_html(&self, report_id: &str) -> Result<HtmlArtifact> {
        let doc = self.report_document(report_id).await?;
        Ok(export_html(&doc)?)
    }

    // -----------------------------------------------------------------------
    // Astrologer chat
    // -----------------------------------------------------------------------

    /// Ask the astrologer edge function a question, optionally about a chart.
    pub async fn ask_astrologer(
        &self,
        question: &str,
        chart: Option<&BirthChart>,
    ) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(StoreError::Validation("question is empty".into()));
        }

        let body = json!({
            "message": question,
            "chartData": chart.map(|c| &c.chart_data),
            "birthInfo": chart.map(|c| json!({
                "name": c.name,
                "birthDate": c.birth_date,
                "birthTime": c.birth_time,
                "location": c.birth_location,
            })),
        });

        let response = self
            .backend
            .invoke(functions::CHAT_WITH_ASTROLOGER, body)
            .await
            .map_err(|e| {
                error!(error = %e, "Astrologer function failed");
                StoreError::from(e)
            })?;

        response
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StoreError::UnexpectedResponse {
                function: functions::CHAT_WITH_ASTROLOGER,
                message: format!("missing `response` field in {}", response),
            })
    }

    /// Log a failure and keep its message on the collection's error slot.
    async fn record(
        &self,
        collection: Collection,
        action: &'static str,
        err: StoreError,
    ) -> StoreError {
        error!(collection = collection.as_str(), action, error = %err, "Store operation failed");
        *self.state.write().await.status_mut(collection).1 = Some(err.to_string());
        err
    }
}

impl std::fmt::Debug for AstrologyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstrologyStore")
            .field("backend", &self.backend.name())
            .field("exporter", &self.exporter)
            .finish_non_exhaustive()
    }
}
