//! Dashboard routes.

use askama::Template;
use astro_core::{AdBanner, AdStats, AdZone, DateRange};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AdminError, Result};
use crate::state::AppState;

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub stats: AdStats,
    pub ads: Vec<AdBanner>,
    pub zones: Vec<AdZone>,
}

/// Optional analytics window. Both ends or neither.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl StatsQuery {
    fn range(&self) -> Result<Option<DateRange>> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(Some(DateRange { start, end })),
            (None, None) => Ok(None),
            _ => Err(AdminError::BadRequest(
                "start and end must be given together".to_string(),
            )),
        }
    }
}

/// Render the dashboard page.
pub async fn dashboard_page(State(state): State<AppState>) -> Result<Html<String>> {
    let stats = state.ads.get_ad_stats(None).await?;
    let ads = state.ads.get_all_ads().await?;
    let zones = state.ads.get_zones().await;
    let page = DashboardTemplate { stats, ads, zones };
    Ok(Html(page.render()?))
}

/// Get ad statistics as JSON.
pub async fn stats_api(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<AdStats>> {
    let stats = state.ads.get_ad_stats(query.range()?).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support;
    use astro_core::tables;
    use serde_json::json;

    #[test]
    fn test_half_open_range_rejected() {
        let query = StatsQuery {
            start: Some(Utc::now()),
            end: None,
        };
        assert!(matches!(query.range(), Err(AdminError::BadRequest(_))));
        assert!(StatsQuery::default().range().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dashboard_renders_stats() {
        let (backend, state) = test_support::state();
        backend.seed(
            tables::AD_BANNERS,
            [json!({
                "id": "ad-1",
                "title": "New Moon Reading",
                "ad_type": "text",
                "content": "Book now",
                "zones": ["sidebar"],
                "priority": 1,
                "is_active": true,
                "created_at": "2024-02-01T00:00:00Z"
            })],
        );
        backend.seed(
            tables::AD_ANALYTICS,
            [
                json!({
                    "id": "e1",
                    "ad_banner_id": "ad-1",
                    "event_type": "view",
                    "zone": "sidebar",
                    "created_at": "2024-02-02T00:00:00Z"
                }),
                json!({
                    "id": "e2",
                    "ad_banner_id": "ad-1",
                    "event_type": "click",
                    "zone": "sidebar",
                    "created_at": "2024-02-02T00:00:01Z"
                }),
            ],
        );

        let Html(html) = dashboard_page(State(state.clone())).await.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("New Moon Reading"));
        assert!(html.contains("100.00%"));

        let Json(stats) = stats_api(State(state), Query(StatsQuery::default())).await.unwrap();
        assert_eq!(stats.total_views, 1);
        assert_eq!(stats.total_clicks, 1);
    }
}
