//! Ad service contract tests against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use ad_service::{default_zones, AdBannerService, AdError, AdServiceConfig};
use astro_core::{
    rpc, tables, AdBannerUpdate, AdEventType, AdType, AdZone, DateRange, NewAdBanner,
};
use chrono::{Duration as ChronoDuration, Utc};
use mock_backend::{FailingBackend, MemoryBackend};
use serde_json::{json, Value};

const HERO: &str = "homepage-hero";

fn banner_row(id: &str, priority: i32, created_at: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Banner {}", id),
        "ad_type": "image",
        "content": "https://cdn.example.com/banner.png",
        "cta_text": "Get your reading",
        "target_url": "https://example.com/reading",
        "zones": [HERO, "sidebar"],
        "start_date": null,
        "end_date": null,
        "priority": priority,
        "is_active": true,
        "created_at": created_at,
    })
}

fn new_banner(title: &str) -> NewAdBanner {
    NewAdBanner {
        title: title.to_string(),
        ad_type: AdType::Text,
        content: "Mercury is in retrograde".to_string(),
        cta_text: None,
        target_url: None,
        zones: vec![HERO.to_string()],
        start_date: None,
        end_date: None,
        priority: 2,
        is_active: true,
    }
}

fn seeded() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::with_ad_functions());
    backend.seed(
        tables::AD_BANNERS,
        [
            banner_row("low", 1, "2024-05-01T00:00:00Z"),
            banner_row("high", 5, "2024-01-01T00:00:00Z"),
            banner_row("mid", 3, "2024-06-01T00:00:00Z"),
        ],
    );
    backend
}

#[tokio::test]
async fn test_max_one_returns_highest_priority() {
    let backend = seeded();
    let service = AdBannerService::new(backend.clone());

    let ads = service.get_active_ads_for_zone(HERO, 1).await.unwrap();

    assert_eq!(ads.len(), 1);
    assert_eq!(ads[0].priority, 5);
    assert_eq!(ads[0].id, "high");
}

#[tokio::test]
async fn test_repeated_read_is_served_from_cache() {
    let backend = seeded();
    let service = AdBannerService::new(backend.clone());

    let first = service.get_active_ads_for_zone(HERO, 3).await.unwrap();
    let second = service.get_active_ads_for_zone(HERO, 3).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.rpc_count(rpc::GET_ACTIVE_ADS_FOR_ZONE), 1);

    // Different limit is a different key
    service.get_active_ads_for_zone(HERO, 2).await.unwrap();
    assert_eq!(backend.rpc_count(rpc::GET_ACTIVE_ADS_FOR_ZONE), 2);
}

#[tokio::test]
async fn test_every_banner_write_clears_the_cache() {
    let backend = seeded();
    let service = AdBannerService::new(backend.clone());
    let calls = || backend.rpc_count(rpc::GET_ACTIVE_ADS_FOR_ZONE);

    service.get_active_ads_for_zone(HERO, 1).await.unwrap();
    service.get_active_ads_for_zone("sidebar", 1).await.unwrap();
    assert_eq!(calls(), 2);

    // create
    let created = service.create_ad_banner(new_banner("Fresh")).await.unwrap();
    service.get_active_ads_for_zone("sidebar", 1).await.unwrap();
    assert_eq!(calls(), 3);

    // update
    let update = AdBannerUpdate {
        priority: Some(10),
        ..Default::default()
    };
    let updated = service.update_ad_banner(&created.id, update).await.unwrap();
    assert_eq!(updated.priority, 10);
    assert!(updated.updated_at.is_some());
    let hero = service.get_active_ads_for_zone(HERO, 1).await.unwrap();
    assert_eq!(calls(), 4);
    assert_eq!(hero[0].id, created.id);

    // delete
    service.delete_ad_banner(&created.id).await.unwrap();
    let hero = service.get_active_ads_for_zone(HERO, 1).await.unwrap();
    assert_eq!(calls(), 5);
    assert_eq!(hero[0].id, "high");
}

#[tokio::test]
async fn test_banner_write_leaves_zone_cache_alone() {
    let backend = seeded();
    backend.seed(
        tables::AD_ZONES,
        [json!({"name": HERO, "display_name": "Homepage Hero", "is_active": true})],
    );
    let service = AdBannerService::new(backend.clone());

    service.get_zones().await;
    service.create_ad_banner(new_banner("Fresh")).await.unwrap();
    service.get_zones().await;

    assert_eq!(backend.select_count(tables::AD_ZONES), 1);
}

#[tokio::test]
async fn test_cache_entries_expire() {
    let backend = seeded();
    let config = AdServiceConfig::default()
        .with_ttls(Duration::from_millis(50), Duration::from_millis(50));
    let service = AdBannerService::with_config(backend.clone(), config);

    service.get_active_ads_for_zone(HERO, 1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    service.get_active_ads_for_zone(HERO, 1).await.unwrap();

    assert_eq!(backend.rpc_count(rpc::GET_ACTIVE_ADS_FOR_ZONE), 2);
}

#[tokio::test]
async fn test_visible_ads_skip_dismissed() {
    let service = AdBannerService::new(seeded());

    let ads = service
        .visible_ads_for_zone(HERO, 3, &["high".to_string()])
        .await
        .unwrap();

    let ids: Vec<&str> = ads.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["mid", "low"]);
}

#[tokio::test]
async fn test_invalid_inputs() {
    let service = AdBannerService::new(seeded());

    assert!(matches!(
        service.get_active_ads_for_zone("", 1).await,
        Err(AdError::Validation(_))
    ));
    assert!(matches!(
        service.get_active_ads_for_zone(HERO, 0).await,
        Err(AdError::Validation(_))
    ));

    let mut banner = new_banner("Backwards");
    banner.start_date = Some(Utc::now());
    banner.end_date = Some(Utc::now() - ChronoDuration::days(1));
    assert!(matches!(
        service.create_ad_banner(banner).await,
        Err(AdError::Validation(_))
    ));

    let err = service.get_ad("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_zones_fall_back_to_defaults() {
    let service = AdBannerService::new(Arc::new(FailingBackend::new()));
    assert_eq!(service.get_zones().await, default_zones());
}

#[tokio::test]
async fn test_zone_writes_clear_zone_cache() {
    let backend = Arc::new(MemoryBackend::new());
    let service = AdBannerService::new(backend.clone());

    assert!(service.get_zones().await.is_empty());

    let zone = AdZone {
        id: None,
        name: "sidebar".into(),
        display_name: "Sidebar".into(),
        description: None,
        max_width: Some(300),
        max_height: Some(600),
        is_active: true,
    };
    service.create_zone(zone.clone()).await.unwrap();
    assert_eq!(service.get_zones().await.len(), 1);

    let renamed = AdZone {
        display_name: "Right Rail".into(),
        ..zone
    };
    let updated = service.update_zone("sidebar", renamed).await.unwrap();
    assert_eq!(updated.display_name, "Right Rail");
    assert_eq!(service.get_zones().await[0].display_name, "Right Rail");
    assert_eq!(backend.select_count(tables::AD_ZONES), 3);
}

#[tokio::test]
async fn test_track_event_and_stats() {
    let backend = seeded();
    let service = AdBannerService::new(backend.clone());

    for _ in 0..3 {
        service
            .track_ad_event("high", AdEventType::View, Some(HERO), Some("user-1"))
            .await
            .unwrap();
    }
    service
        .track_ad_event("high", AdEventType::Click, Some(HERO), Some("user-1"))
        .await
        .unwrap();
    service
        .track_ad_event("mid", AdEventType::View, Some("sidebar"), None)
        .await
        .unwrap();

    assert_eq!(backend.rows(tables::AD_ANALYTICS).len(), 5);

    let stats = service.get_ad_stats(None).await.unwrap();
    assert_eq!(stats.total_ads, 3);
    assert_eq!(stats.total_views, 4);
    assert_eq!(stats.total_clicks, 1);
    assert_eq!(stats.overall_ctr, 25.0);
    assert_eq!(stats.top_ads[0].ad_id, "high");
    assert_eq!(stats.top_ads[0].ctr, 33.33);
    assert_eq!(stats.zone_stats[0].zone, HERO);

    // A window in the past sees nothing
    let past = DateRange {
        start: Utc::now() - ChronoDuration::days(30),
        end: Utc::now() - ChronoDuration::days(29),
    };
    let stats = service.get_ad_stats(Some(past)).await.unwrap();
    assert_eq!(stats.total_views, 0);
    assert_eq!(stats.overall_ctr, 0.0);
}

#[tokio::test]
async fn test_track_event_failure_is_swallowed() {
    let backend = seeded();
    let service = AdBannerService::new(backend.clone());

    // Unknown banner: the RPC rejects it, the task still completes cleanly
    service
        .track_ad_event("ghost", AdEventType::Click, None, None)
        .await
        .unwrap();
    assert!(backend.rows(tables::AD_ANALYTICS).is_empty());
}
