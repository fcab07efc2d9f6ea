//! Ad banner and zone API.

use astro_core::{AdBanner, AdBannerUpdate, AdEventType, AdZone, NewAdBanner};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

const DEFAULT_ZONE_LIMIT: usize = 1;

/// Query string for zone lookups.
#[derive(Debug, Deserialize)]
pub struct ZoneQuery {
    pub limit: Option<usize>,
}

/// Body of an event tracking request.
#[derive(Debug, Deserialize)]
pub struct TrackEventRequest {
    pub event_type: AdEventType,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// List every banner.
pub async fn list_ads(State(state): State<AppState>) -> Result<Json<Vec<AdBanner>>> {
    Ok(Json(state.ads.get_all_ads().await?))
}

pub async fn get_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdBanner>> {
    Ok(Json(state.ads.get_ad(&id).await?))
}

/// Create a banner.
pub async fn create_ad(
    State(state): State<AppState>,
    Json(banner): Json<NewAdBanner>,
) -> Result<(StatusCode, Json<AdBanner>)> {
    let created = state.ads.create_ad_banner(banner).await?;
    info!(ad_id = %created.id, "Banner created from admin");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Apply a partial update to a banner.
pub async fn update_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<AdBannerUpdate>,
) -> Result<Json<AdBanner>> {
    Ok(Json(state.ads.update_ad_banner(&id, update).await?))
}

pub async fn delete_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.ads.delete_ad_banner(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Live ads for a zone, `limit` defaulting to one.
pub async fn zone_ads(
    State(state): State<AppState>,
    Path(zone): Path<String>,
    Query(query): Query<ZoneQuery>,
) -> Result<Json<Vec<AdBanner>>> {
    let limit = query.limit.unwrap_or(DEFAULT_ZONE_LIMIT);
    Ok(Json(state.ads.get_active_ads_for_zone(&zone, limit).await?))
}

/// Queue a view or click. Always accepted; delivery failures are only logged.
pub async fn track_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TrackEventRequest>,
) -> StatusCode {
    state
        .ads
        .track_ad_event(&id, req.event_type, req.zone.as_deref(), req.user_id.as_deref());
    StatusCode::ACCEPTED
}

pub async fn list_zones(State(state): State<AppState>) -> Json<Vec<AdZone>> {
    Json(state.ads.get_zones().await)
}

pub async fn create_zone(
    State(state): State<AppState>,
    Json(zone): Json<AdZone>,
) -> Result<(StatusCode, Json<AdZone>)> {
    let created = state.ads.create_zone(zone).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_zone(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(zone): Json<AdZone>,
) -> Result<Json<AdZone>> {
    Ok(Json(state.ads.update_zone(&name, zone).await?))
}
