//! Store contract tests against the in-memory backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use astro_core::{
    async_trait, functions, tables, Backend, BackendError, BirthLocation, Filter, NewBirthChart,
    Query, ReportType,
};
use astrology_store::{AstrologyStore, Collection, ReportOptions, StoreError};
use chrono::NaiveDate;
use mock_backend::{DelayedBackend, FailingBackend, MemoryBackend};
use report_export::{
    ExportConfig, ExportError, RecordingNotifier, RenderedPdf, Renderer, ReportDocument,
    ReportExporter, ToastLevel,
};
use serde_json::{json, Value};

const USER: &str = "user-1";

fn new_chart(name: &str) -> NewBirthChart {
    NewBirthChart {
        name: name.to_string(),
        birth_date: NaiveDate::from_ymd_opt(1992, 8, 14).unwrap(),
        birth_time: "06:45".to_string(),
        birth_location: BirthLocation {
            lat: 40.71,
            lng: -74.0,
            city: "New York".to_string(),
            country: "United States".to_string(),
        },
        user_id: USER.to_string(),
    }
}

fn seed_template(backend: &MemoryBackend) {
    backend.seed(
        tables::REPORT_TEMPLATES,
        [json!({
            "id": "tpl-career",
            "name": "Career Path",
            "description": "Where your chart points professionally.",
            "category_id": null,
            "report_type": "natal",
            "sections": [
                {"name": "Vocation", "content": null, "order": 2},
                {
                    "name": "Introduction",
                    "content": "Your working life, read from the stars.",
                    "order": 1
                },
                {"name": "Challenges", "order": 3}
            ],
            "is_premium": true,
            "is_active": true
        })],
    );
}

fn chart_row(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "birth_date": "1990-01-01",
        "birth_time": "12:00",
        "birth_location": {"lat": 0.0, "lng": 0.0, "city": "Quito", "country": "Ecuador"},
        "chart_data": {
            "planets": [], "aspects": [], "houses": [],
            "elements": {"fire": 25.0, "earth": 25.0, "air": 25.0, "water": 25.0},
            "modalities": {"cardinal": 30.0, "fixed": 40.0, "mutable": 30.0}
        },
        "user_id": USER,
        "created_at": "2024-01-01T00:00:00Z"
    })
}

/// Memory backend whose updates always fail.
struct FailingUpdates(MemoryBackend);

#[async_trait]
impl Backend for FailingUpdates {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        self.0.select(query).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        self.0.insert(table, row).await
    }

    async fn update(
        &self,
        _table: &str,
        _filters: &[Filter],
        _patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        Err(BackendError::Unavailable("update rejected".to_string()))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, BackendError> {
        self.0.delete(table, filters).await
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<Value, BackendError> {
        self.0.rpc(function, params).await
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<Value, BackendError> {
        self.0.invoke(function, body).await
    }

    fn name(&self) -> &str {
        "FailingUpdates"
    }
}

/// First select is slow and returns one chart; later selects are fast and return another.
struct SlowFirstSelect {
    calls: AtomicUsize,
}

#[async_trait]
impl Backend for SlowFirstSelect {
    async fn select(&self, _query: &Query) -> Result<Vec<Value>, BackendError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(vec![chart_row("stale", "Stale")])
        } else {
            Ok(vec![chart_row("fresh", "Fresh")])
        }
    }

    async fn insert(&self, _table: &str, row: Value) -> Result<Value, BackendError> {
        Ok(row)
    }

    async fn update(
        &self,
        _table: &str,
        _filters: &[Filter],
        _patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _table: &str, _filters: &[Filter]) -> Result<usize, BackendError> {
        Ok(0)
    }

    async fn rpc(&self, function: &str, _params: Value) -> Result<Value, BackendError> {
        Err(BackendError::UnknownFunction(function.to_string()))
    }

    async fn invoke(&self, function: &str, _body: Value) -> Result<Value, BackendError> {
        Err(BackendError::UnknownFunction(function.to_string()))
    }

    fn name(&self) -> &str {
        "SlowFirstSelect"
    }
}

#[tokio::test]
async fn test_failed_fetches_record_errors_and_leave_collections_empty() {
    let store = AstrologyStore::new(Arc::new(FailingBackend::new()));

    assert!(store.fetch_birth_charts(USER).await.is_err());
    assert!(store.fetch_reports(USER).await.is_err());
    assert!(store.fetch_compatibility_reports(USER).await.is_err());

    let state = store.state().await;
    for collection in [
        Collection::BirthCharts,
        Collection::Reports,
        Collection::CompatibilityReports,
    ] {
        let error = state.error(collection).unwrap_or_default();
        assert!(!error.is_empty(), "{:?} error should be set", collection);
    }
    assert!(state.birth_charts.is_empty());
    assert!(state.reports.is_empty());
    assert!(state.compatibility_reports.is_empty());
    assert!(!state.is_loading());

    store.clear_errors().await;
    assert!(store.state().await.error(Collection::Reports).is_none());
}

#[tokio::test]
async fn test_fetch_orders_newest_first_and_scopes_to_user() {
    let backend = Arc::new(MemoryBackend::new());
    let mut older = chart_row("c-old", "Older");
    older["created_at"] = json!("2023-03-01T00:00:00Z");
    let mut other = chart_row("c-other", "Someone else");
    other["user_id"] = json!("user-2");
    backend.seed(tables::BIRTH_CHARTS, [older, chart_row("c-new", "Newer"), other]);

    let store = AstrologyStore::new(backend.clone());
    let charts = store.fetch_birth_charts(USER).await.unwrap();

    let ids: Vec<&str> = charts.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c-new", "c-old"]);
    assert_eq!(store.state().await.birth_charts.len(), 2);
}

#[tokio::test]
async fn test_fetch_success_clears_previous_error() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AstrologyStore::new(backend.clone());

    backend.fail_table(tables::ASTROLOGY_REPORTS);
    assert!(store.fetch_reports(USER).await.is_err());
    assert!(store.state().await.reports_error.is_some());

    backend.recover_table(tables::ASTROLOGY_REPORTS);
    store.fetch_reports(USER).await.unwrap();
    assert!(store.state().await.reports_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_latest_fetch_wins() {
    let store = AstrologyStore::new(Arc::new(SlowFirstSelect {
        calls: AtomicUsize::new(0),
    }));

    let (first, second) = tokio::join!(
        store.fetch_birth_charts(USER),
        store.fetch_birth_charts(USER)
    );

    // Both callers get their own response
    assert_eq!(first.unwrap()[0].id, "stale");
    assert_eq!(second.unwrap()[0].id, "fresh");

    // Only the newer request landed in state
    let state = store.state().await;
    assert_eq!(state.birth_charts.len(), 1);
    assert_eq!(state.birth_charts[0].id, "fresh");
}

#[tokio::test]
async fn test_create_birth_chart_prepends_and_selects() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AstrologyStore::new(backend.clone()).with_seed(42);

    let first = store.create_birth_chart(new_chart("Ada")).await.unwrap();
    let second = store.create_birth_chart(new_chart("Grace")).await.unwrap();

    assert_eq!(second.chart_data.planets.len(), 10);
    assert_eq!(second.chart_data.houses.len(), 12);

    let state = store.state().await;
    assert_eq!(state.birth_charts[0].id, second.id);
    assert_eq!(state.birth_charts[1].id, first.id);
    assert_eq!(state.current_chart.as_ref().map(|c| c.id.as_str()), Some(second.id.as_str()));
    assert_eq!(backend.rows(tables::BIRTH_CHARTS).len(), 2);
}

#[tokio::test]
async fn test_create_birth_chart_requires_name() {
    let store = AstrologyStore::new(Arc::new(MemoryBackend::new()));
    let err = store.create_birth_chart(new_chart("  ")).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn test_template_report_round_trip_has_every_section_heading() {
    let backend = Arc::new(MemoryBackend::new());
    seed_template(&backend);
    let store = AstrologyStore::new(backend.clone()).with_seed(1);

    let chart = store.create_birth_chart(new_chart("Ada")).await.unwrap();
    let created = store
        .create_report_from_template("tpl-career", &chart.id, USER, ReportOptions::default())
        .await
        .unwrap();

    assert_eq!(created.title, "Career Path - Ada");
    assert_eq!(created.template_id.as_deref(), Some("tpl-career"));
    assert!(created.is_premium);

    let reports = store.fetch_reports(USER).await.unwrap();
    assert_eq!(reports.len(), 1);
    let content = &reports[0].content;
    for section in ["Introduction", "Vocation", "Challenges"] {
        assert!(
            content.contains(&format!("## {}", section)),
            "missing heading for {}",
            section
        );
    }
    assert!(content.contains("Your working life, read from the stars."));
    assert!(content.find("## Introduction") < content.find("## Vocation"));
}

#[tokio::test]
async fn test_template_report_with_options() {
    let backend = Arc::new(MemoryBackend::new());
    seed_template(&backend);
    let store = AstrologyStore::new(backend.clone());
    let chart = store.create_birth_chart(new_chart("Ada")).await.unwrap();

    let options = ReportOptions {
        title: Some("My Career".to_string()),
        is_premium: Some(false),
    };
    let report = store
        .create_report_from_template("tpl-career", &chart.id, USER, options)
        .await
        .unwrap();
    assert_eq!(report.title, "My Career");
    assert!(!report.is_premium);
    assert!(report.content.starts_with("# My Career"));
}

#[tokio::test]
async fn test_missing_template_is_not_found() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AstrologyStore::new(backend.clone());
    let chart = store.create_birth_chart(new_chart("Ada")).await.unwrap();

    let err = store
        .create_report_from_template("nope", &chart.id, USER, ReportOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(store.state().await.reports_error.is_some());
    assert!(backend.rows(tables::ASTROLOGY_REPORTS).is_empty());
}

#[tokio::test]
async fn test_failed_content_update_removes_placeholder() {
    let memory = MemoryBackend::new();
    seed_template(&memory);
    memory.seed(tables::BIRTH_CHARTS, [chart_row("c1", "Ada")]);
    let backend = Arc::new(FailingUpdates(memory));
    let store = AstrologyStore::new(backend.clone());

    let err = store
        .create_report_from_template("tpl-career", "c1", USER, ReportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Backend(BackendError::Unavailable(_))));
    assert!(backend.0.rows(tables::ASTROLOGY_REPORTS).is_empty());
    assert!(store.state().await.reports.is_empty());
}

#[tokio::test]
async fn test_natal_and_vedic_reports() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AstrologyStore::new(backend.clone()).with_seed(9);
    let chart = store.create_birth_chart(new_chart("Ada")).await.unwrap();

    let natal = store.create_natal_chart_report(&chart.id, USER).await.unwrap();
    assert_eq!(natal.report_type, ReportType::Natal);
    assert_eq!(natal.title, "Ada Natal Chart");
    assert!(natal.content.contains("## Planetary Positions"));

    let vedic = store.create_vedic_report(&chart.id, USER).await.unwrap();
    assert_eq!(vedic.report_type, ReportType::Vedic);
    assert!(vedic.content.contains("sidereal"));

    let state = store.state().await;
    assert_eq!(state.reports.len(), 2);
    assert_eq!(state.reports[0].id, vedic.id);
}

#[tokio::test]
async fn test_delete_report_and_chart() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AstrologyStore::new(backend.clone());
    let chart = store.create_birth_chart(new_chart("Ada")).await.unwrap();
    let report = store.create_natal_chart_report(&chart.id, USER).await.unwrap();

    store.delete_report(&report.id).await.unwrap();
    assert!(store.state().await.reports.is_empty());
    assert!(backend.rows(tables::ASTROLOGY_REPORTS).is_empty());

    let err = store.delete_report(&report.id).await.unwrap_err();
    assert!(err.is_not_found());

    store.delete_birth_chart(&chart.id).await.unwrap();
    let state = store.state().await;
    assert!(state.birth_charts.is_empty());
    assert!(state.current_chart.is_none());
}

#[tokio::test]
async fn test_compatibility_report_and_analysis() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AstrologyStore::new(backend.clone()).with_seed(5);
    let a = store.create_birth_chart(new_chart("Ada")).await.unwrap();
    let b = store.create_birth_chart(new_chart("Grace")).await.unwrap();

    let report = store.create_compatibility_report(USER, &a.id, &b.id).await.unwrap();
    assert!((0.0..=100.0).contains(&report.compatibility_score));
    assert!(report.summary.is_some());
    assert_eq!(store.state().await.compatibility_reports.len(), 1);

    let analysis = store.analyze_compatibility(&a.id, &b.id).await.unwrap();
    assert_eq!(analysis.score, report.compatibility_score);

    let same = store.create_compatibility_report(USER, &a.id, &a.id).await;
    assert!(matches!(same, Err(StoreError::Validation(_))));
}

#[tokio::test]
async fn test_export_pdf_and_html() {
    let backend = Arc::new(MemoryBackend::new());
    let store = AstrologyStore::new(backend.clone());
    let chart = store.create_birth_chart(new_chart("Ada")).await.unwrap();
    let report = store.create_natal_chart_report(&chart.id, USER).await.unwrap();

    let pdf = store.export_report_to_pdf(&report.id).await.unwrap();
    assert!(pdf.bytes.starts_with(b"%PDF"));
    assert_eq!(pdf.filename, "ada_natal_chart.pdf");
    let state = store.state().await;
    assert!(!state.pdf_exporting);
    assert!(state.pdf_error.is_none());

    let html = store.export_report_to_html(&report.id).await.unwrap();
    assert_eq!(html.filename, "ada_natal_chart.html");
    assert!(html.html.contains("<h2>Planetary Positions</h2>"));
    assert!(html.html.contains("New York"));
}

#[tokio::test]
async fn test_export_missing_report_sets_pdf_error() {
    let store = AstrologyStore::new(Arc::new(MemoryBackend::new()));

    let err = store.export_report_to_pdf("missing").await.unwrap_err();
    assert!(err.is_not_found());

    let state = store.state().await;
    assert!(!state.pdf_exporting);
    assert!(state.pdf_error.is_some());
}

#[tokio::test]
async fn test_pdf_exporting_is_visible_while_in_flight() {
    let inner = MemoryBackend::new();
    inner.seed(tables::BIRTH_CHARTS, [chart_row("chart-1", "Ada")]);
    inner.seed(
        tables::ASTROLOGY_REPORTS,
        [json!({
            "id": "rep-1",
            "title": "Ada's Year Ahead",
            "report_type": "transit",
            "birth_chart_id": "chart-1",
            "user_id": USER,
            "content": "## Overview\n\nSaturn asks for patience.",
            "created_at": "2024-01-02T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        })],
    );
    let backend = DelayedBackend::with_millis(inner, 100);
    let store = Arc::new(AstrologyStore::new(Arc::new(backend)));

    let task = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.export_report_to_pdf("rep-1").await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(store.state().await.pdf_exporting);

    let pdf = task.await.unwrap().unwrap();
    assert_eq!(pdf.filename, "ada_s_year_ahead.pdf");
    assert!(!pdf.degraded);
    assert!(!store.state().await.pdf_exporting);
}

struct StalledRenderer;

#[async_trait]
impl Renderer for StalledRenderer {
    async fn render(&self, _doc: &ReportDocument) -> Result<RenderedPdf, ExportError> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_pdf_export_times_out_and_resets_state() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(tables::BIRTH_CHARTS, [chart_row("chart-1", "Ada")]);
    backend.seed(
        tables::ASTROLOGY_REPORTS,
        [json!({
            "id": "rep-1",
            "title": "Ada Natal Chart",
            "report_type": "natal",
            "birth_chart_id": "chart-1",
            "user_id": USER,
            "content": "## Planetary Positions\n\nSun in Leo.",
            "created_at": "2024-01-02T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z"
        })],
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let exporter = ReportExporter::from_config(ExportConfig::default())
        .with_renderers(Arc::new(StalledRenderer), Arc::new(StalledRenderer))
        .with_notifier(notifier.clone());
    let store = AstrologyStore::with_exporter(backend, Arc::new(exporter));

    let err = store.export_report_to_pdf("rep-1").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Export(ExportError::Timeout(d)) if d == Duration::from_secs(20)
    ));

    let state = store.state().await;
    assert!(!state.pdf_exporting);
    assert_eq!(
        state.pdf_error.as_deref(),
        Some("PDF generation timed out after 20s")
    );

    let toasts = notifier.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Error);
    assert_eq!(toasts[0].title, "PDF export timed out");
}

#[tokio::test]
async fn test_ask_astrologer() {
    let backend = MemoryBackend::new().with_function(functions::CHAT_WITH_ASTROLOGER, |_, body| {
        let question = body["message"].as_str().unwrap_or_default();
        Ok(json!({ "response": format!("You asked: {}", question) }))
    });
    let store = AstrologyStore::new(Arc::new(backend));

    let answer = store.ask_astrologer("  Will Mercury retrograde hurt?  ", None).await.unwrap();
    assert_eq!(answer, "You asked: Will Mercury retrograde hurt?");

    let empty = store.ask_astrologer("   ", None).await;
    assert!(matches!(empty, Err(StoreError::Validation(_))));
}

#[tokio::test]
async fn test_ask_astrologer_bad_response() {
    let backend = MemoryBackend::new()
        .with_function(functions::CHAT_WITH_ASTROLOGER, |_, _| Ok(json!({ "error": "quota" })));
    let store = AstrologyStore::new(Arc::new(backend));

    let err = store.ask_astrologer("hello", None).await.unwrap_err();
    assert!(matches!(err, StoreError::UnexpectedResponse { .. }));
}
