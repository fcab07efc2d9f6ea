//! The ad banner service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use astro_core::{
    rpc, table, tables, AdAnalytics, AdBanner, AdBannerUpdate, AdEventType, AdStats, AdZone,
    Backend, DateRange, Filter, NewAdBanner, Query,
};
use chrono::Utc;
use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AdServiceConfig;
use crate::error::{AdError, Result};
use crate::stats;
use crate::zones::default_zones;

const ZONES_KEY: &str = "zones";

#[derive(Serialize)]
struct ActiveAdsParams<'a> {
    zone_name: &'a str,
    max_ads: usize,
}

#[derive(Serialize)]
struct TrackEventParams {
    ad_id: String,
    event_type: AdEventType,
    zone_name: Option<String>,
    user_id: Option<String>,
}

#[derive(Serialize)]
struct BannerPatch<'a> {
    #[serde(flatten)]
    update: &'a AdBannerUpdate,
    updated_at: chrono::DateTime<Utc>,
}

/// Ad banners and zones with read caching and fire-and-forget event tracking.
///
/// Construct one per process and share it behind an `Arc`. Zone ad lists are
/// cached per `"{zone}-{limit}"` key; any banner write clears that whole cache
/// (the zone cache is untouched). Zone writes clear the zone cache.
pub struct AdBannerService {
    backend: Arc<dyn Backend>,
    config: AdServiceConfig,
    ad_cache: Cache<String, Arc<Vec<AdBanner>>>,
    zone_cache: Cache<&'static str, Arc<Vec<AdZone>>>,
    ad_generation: AtomicU64,
    zone_generation: AtomicU64,
}

impl AdBannerService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_config(backend, AdServiceConfig::default())
    }

    pub fn with_config(backend: Arc<dyn Backend>, config: AdServiceConfig) -> Self {
        let ad_cache = Cache::builder()
            .max_capacity(config.max_cached_queries)
            .time_to_live(config.ad_cache_ttl)
            .build();
        let zone_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.zone_cache_ttl)
            .build();

        Self {
            backend,
            config,
            ad_cache,
            zone_cache,
            ad_generation: AtomicU64::new(0),
            zone_generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &AdServiceConfig {
        &self.config
    }

    fn cache_key(zone: &str, limit: usize) -> String {
        format!("{}-{}", zone, limit)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Live ads for a zone, highest priority first, at most `limit`.
    pub async fn get_active_ads_for_zone(&self, zone: &str, limit: usize) -> Result<Vec<AdBanner>> {
        if zone.trim().is_empty() {
            return Err(AdError::Validation("zone name is required".into()));
        }
        if limit == 0 {
            return Err(AdError::Validation("limit must be at least 1".into()));
        }

        let key = Self::cache_key(zone, limit);
        if let Some(hit) = self.ad_cache.get(&key).await {
            debug!(key = %key, "Ad cache hit");
            return Ok(hit.as_ref().clone());
        }

        let generation = self.ad_generation.load(Ordering::SeqCst);
        let params = ActiveAdsParams {
            zone_name: zone,
            max_ads: limit,
        };
        let ads: Vec<AdBanner> =
            table::call_rpc(self.backend.as_ref(), rpc::GET_ACTIVE_ADS_FOR_ZONE, &params).await?;
        debug!(key = %key, count = ads.len(), "Fetched ads for zone");

        // A write during the fetch means this result may already be stale
        if self.ad_generation.load(Ordering::SeqCst) == generation {
            self.ad_cache.insert(key.clone(), Arc::new(ads.clone())).await;
            if self.ad_generation.load(Ordering::SeqCst) != generation {
                self.ad_cache.invalidate(&key).await;
            }
        }

        Ok(ads)
    }

    /// Like [`get_active_ads_for_zone`](Self::get_active_ads_for_zone), minus banners the
    /// user dismissed.
    pub async fn visible_ads_for_zone(
        &self,
        zone: &str,
        limit: usize,
        dismissed: &[String],
    ) -> Result<Vec<AdBanner>> {
        let mut ads = self.get_active_ads_for_zone(zone, limit).await?;
        ads.retain(|ad| !dismissed.contains(&ad.id));
        Ok(ads)
    }

    /// Every banner, for the admin list.
    pub async fn get_all_ads(&self) -> Result<Vec<AdBanner>> {
        let query = Query::table(tables::AD_BANNERS)
            .order_desc("priority")
            .order_desc("created_at");
        Ok(table::fetch_all(self.backend.as_ref(), &query).await?)
    }

    pub async fn get_ad(&self, ad_id: &str) -> Result<AdBanner> {
        Ok(table::fetch_by_id(self.backend.as_ref(), tables::AD_BANNERS, "AdBanner", ad_id).await?)
    }

    /// Active zones. Falls back to [`default_zones`] when the table cannot be read.
    pub async fn get_zones(&self) -> Vec<AdZone> {
        if let Some(hit) = self.zone_cache.get(&ZONES_KEY).await {
            return hit.as_ref().clone();
        }

        let generation = self.zone_generation.load(Ordering::SeqCst);
        let query = Query::table(tables::AD_ZONES)
            .eq("is_active", true)
            .order_asc("display_name");

        match table::fetch_all::<AdZone>(self.backend.as_ref(), &query).await {
            Ok(zones) => {
                if self.zone_generation.load(Ordering::SeqCst) == generation {
                    self.zone_cache.insert(ZONES_KEY, Arc::new(zones.clone())).await;
                }
                zones
            }
            Err(e) => {
                warn!(error = %e, "Failed to load ad zones, using defaults");
                default_zones()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    fn clear_ad_cache(&self) {
        self.ad_generation.fetch_add(1, Ordering::SeqCst);
        self.ad_cache.invalidate_all();
    }

    fn clear_zone_cache(&self) {
        self.zone_generation.fetch_add(1, Ordering::SeqCst);
        self.zone_cache.invalidate_all();
    }

    fn validate_window(
        start: Option<chrono::DateTime<Utc>>,
        end: Option<chrono::DateTime<Utc>>,
    ) -> Result<()> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(AdError::Validation("end date is before start date".into()));
            }
        }
        Ok(())
    }

    pub async fn create_ad_banner(&self, banner: NewAdBanner) -> Result<AdBanner> {
        if banner.title.trim().is_empty() {
            return Err(AdError::Validation("title is required".into()));
        }
        Self::validate_window(banner.start_date, banner.end_date)?;

        let result = table::insert_row(self.backend.as_ref(), tables::AD_BANNERS, &banner).await;
        self.clear_ad_cache();
        let created: AdBanner = result?;
        info!(ad_id = %created.id, title = %created.title, "Created ad banner");
        Ok(created)
    }

    pub async fn update_ad_banner(&self, ad_id: &str, update: AdBannerUpdate) -> Result<AdBanner> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AdError::Validation("title cannot be empty".into()));
        }
        Self::validate_window(update.start_date, update.end_date)?;

        let patch = BannerPatch {
            update: &update,
            updated_at: Utc::now(),
        };
        let backend = self.backend.as_ref();
        let result =
            table::update_by_id(backend, tables::AD_BANNERS, "AdBanner", ad_id, &patch).await;
        self.clear_ad_cache();
        let updated: AdBanner = result?;
        info!(ad_id, "Updated ad banner");
        Ok(updated)
    }

    pub async fn delete_ad_banner(&self, ad_id: &str) -> Result<()> {
        let backend = self.backend.as_ref();
        let result = table::delete_by_id(backend, tables::AD_BANNERS, "AdBanner", ad_id).await;
        self.clear_ad_cache();
        result?;
        info!(ad_id, "Deleted ad banner");
        Ok(())
    }

    pub async fn create_zone(&self, zone: AdZone) -> Result<AdZone> {
        if zone.name.trim().is_empty() || zone.display_name.trim().is_empty() {
            return Err(AdError::Validation("zone name and display name are required".into()));
        }
        let result = table::insert_row(self.backend.as_ref(), tables::AD_ZONES, &zone).await;
        self.clear_zone_cache();
        let created: AdZone = result?;
        info!(zone = %created.name, "Created ad zone");
        Ok(created)
    }

    /// Replace the zone with the given name.
    pub async fn update_zone(&self, name: &str, zone: AdZone) -> Result<AdZone> {
        let filters = [Filter::Eq("name".to_string(), Value::from(name))];
        let patch = serde_json::to_value(&zone).map_err(astro_core::BackendError::from)?;
        let result = self.backend.update(tables::AD_ZONES, &filters, patch).await;
        self.clear_zone_cache();

        let row = result?
            .into_iter()
            .next()
            .ok_or_else(|| astro_core::BackendError::NotFound {
                entity: "AdZone",
                id: name.to_string(),
            })?;
        let updated: AdZone = serde_json::from_value(row).map_err(astro_core::BackendError::from)?;
        info!(zone = %updated.name, "Updated ad zone");
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Analytics
    // -----------------------------------------------------------------------

    /// Record a view or click in the background. Failures are logged only.
    ///
    /// The returned handle may be dropped; it is there for callers that want
    /// to wait for the write (tests, shutdown).
    pub fn track_ad_event(
        &self,
        ad_id: &str,
        event_type: AdEventType,
        zone: Option<&str>,
        user_id: Option<&str>,
    ) -> JoinHandle<()> {
        let backend = Arc::clone(&self.backend);
        let params = TrackEventParams {
            ad_id: ad_id.to_string(),
            event_type,
            zone_name: zone.map(String::from),
            user_id: user_id.map(String::from),
        };

        tokio::spawn(async move {
            let result = match serde_json::to_value(&params) {
                Ok(body) => backend.rpc(rpc::TRACK_AD_EVENT, body).await.map(|_| ()),
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(()) => debug!(
                    ad_id = %params.ad_id,
                    event = params.event_type.as_str(),
                    "Tracked ad event"
                ),
                Err(e) => warn!(
                    ad_id = %params.ad_id,
                    event = params.event_type.as_str(),
                    error = %e,
                    "Failed to track ad event"
                ),
            }
        })
    }

    /// Aggregate banners and analytics, optionally limited to a time window.
    pub async fn get_ad_stats(&self, range: Option<DateRange>) -> Result<AdStats> {
        let banners: Vec<AdBanner> =
            table::fetch_all(self.backend.as_ref(), &Query::table(tables::AD_BANNERS)).await?;

        let mut query = Query::table(tables::AD_ANALYTICS);
        if let Some(range) = range {
            if range.end < range.start {
                return Err(AdError::Validation("end date is before start date".into()));
            }
            query = query
                .gte("created_at", range.start.to_rfc3339())
                .lte("created_at", range.end.to_rfc3339());
        }
        let events: Vec<AdAnalytics> = table::fetch_all(self.backend.as_ref(), &query).await?;

        debug!(banners = banners.len(), events = events.len(), "Aggregating ad stats");
        Ok(stats::aggregate(&banners, &events))
    }
}

impl std::fmt::Debug for AdBannerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdBannerService")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("cached_queries", &self.ad_cache.entry_count())
            .finish()
    }
}
