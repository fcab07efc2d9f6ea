//! Reference implementations of the ad database functions.
//!
//! They follow `supabase/migrations/0002_ad_functions.sql` so tests against
//! [`MemoryBackend`](crate::MemoryBackend) see the same ordering and
//! constraints as the hosted project.

use std::cmp::Ordering;

use astro_core::{compare_values, tables, AdBanner, BackendError};
use chrono::Utc;
use serde_json::{json, Value};

use crate::memory::{now_timestamp, Tables};

/// `get_active_ads_for_zone(zone_name text, max_ads int)`
///
/// Active banners assigned to the zone and inside their date window, ordered
/// by priority (highest first) then recency, truncated to `max_ads`.
pub fn get_active_ads_for_zone(db: &mut Tables, params: &Value) -> Result<Value, BackendError> {
    let zone = params
        .get("zone_name")
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::Constraint("zone_name is required".to_string()))?;
    let max_ads = params.get("max_ads").and_then(Value::as_u64).unwrap_or(1) as usize;
    let now = Utc::now();

    let mut matching: Vec<Value> = db
        .get(tables::AD_BANNERS)
        .map(|rows| {
            rows.iter()
                .filter(|row| {
                    serde_json::from_value::<AdBanner>((*row).clone())
                        .map(|ad| ad.is_live_at(now) && ad.zones.iter().any(|z| z == zone))
                        .unwrap_or(false)
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    matching.sort_by(|a, b| {
        let by_priority = compare_values(&b["priority"], &a["priority"]);
        if by_priority != Ordering::Equal {
            return by_priority;
        }
        compare_values(&b["created_at"], &a["created_at"])
    });
    matching.truncate(max_ads);

    Ok(Value::Array(matching))
}

/// `track_ad_event(ad_id uuid, event_type text, zone_name text, user_id uuid)`
///
/// Appends one analytics row; the banner must exist.
pub fn track_ad_event(db: &mut Tables, params: &Value) -> Result<Value, BackendError> {
    let ad_id = params
        .get("ad_id")
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::Constraint("ad_id is required".to_string()))?;
    let event_type = params
        .get("event_type")
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::Constraint("event_type is required".to_string()))?;

    if event_type != "view" && event_type != "click" {
        return Err(BackendError::Constraint(format!(
            "invalid event_type {}",
            event_type
        )));
    }

    let banner_exists = db
        .get(tables::AD_BANNERS)
        .map(|rows| rows.iter().any(|r| r["id"] == ad_id))
        .unwrap_or(false);
    if !banner_exists {
        return Err(BackendError::Constraint(format!(
            "ad_analytics.ad_banner_id references missing banner {}",
            ad_id
        )));
    }

    let row = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "ad_banner_id": ad_id,
        "event_type": event_type,
        "zone": params.get("zone_name").cloned().unwrap_or(Value::Null),
        "user_id": params.get("user_id").cloned().unwrap_or(Value::Null),
        "created_at": now_timestamp(),
    });
    db.entry(tables::AD_ANALYTICS.to_string())
        .or_default()
        .push(row);

    Ok(Value::Null)
}
