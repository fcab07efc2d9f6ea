//! Route handlers for the admin web interface.

pub mod ads;
pub mod dashboard;
pub mod health;
pub mod reports;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // HTML pages
        .route("/", get(dashboard::dashboard_page))
        // Health check
        .route("/health", get(health::health))
        // Ads
        .route("/api/ads", get(ads::list_ads).post(ads::create_ad))
        .route("/api/ads/stats", get(dashboard::stats_api))
        .route("/api/ads/zone/:zone", get(ads::zone_ads))
        .route(
            "/api/ads/:id",
            get(ads::get_ad).patch(ads::update_ad).delete(ads::delete_ad),
        )
        .route("/api/ads/:id/events", post(ads::track_event))
        // Zones
        .route("/api/zones", get(ads::list_zones).post(ads::create_zone))
        .route("/api/zones/:name", patch(ads::update_zone))
        // Report downloads
        .route("/api/reports/:id/pdf", get(reports::report_pdf))
        .route("/api/reports/:id/html", get(reports::report_html))
}
