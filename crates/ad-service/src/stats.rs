//! Client-side aggregation of the analytics log.

use std::collections::HashMap;

use astro_core::{AdAnalytics, AdBanner, AdEventType, AdPerformance, AdStats, ZonePerformance};

/// How many ads the ranking keeps.
pub const TOP_ADS: usize = 10;

/// Zone label for events recorded without one.
pub const UNKNOWN_ZONE: &str = "unknown";

/// Click-through rate in percent, rounded to two decimals. Zero when there are no views.
pub fn ctr(clicks: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    let pct = clicks as f64 / views as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[derive(Default, Clone, Copy)]
struct Counts {
    views: u64,
    clicks: u64,
}

impl Counts {
    fn add(&mut self, event: AdEventType) {
        match event {
            AdEventType::View => self.views += 1,
            AdEventType::Click => self.clicks += 1,
        }
    }
}

/// Totals, overall CTR, the top ads by CTR and every zone ranked by views.
pub fn aggregate(banners: &[AdBanner], events: &[AdAnalytics]) -> AdStats {
    let mut totals = Counts::default();
    let mut per_ad: HashMap<&str, Counts> = HashMap::new();
    let mut per_zone: HashMap<&str, Counts> = HashMap::new();

    for event in events {
        totals.add(event.event_type);
        per_ad
            .entry(event.ad_banner_id.as_str())
            .or_default()
            .add(event.event_type);
        per_zone
            .entry(event.zone.as_deref().unwrap_or(UNKNOWN_ZONE))
            .or_default()
            .add(event.event_type);
    }

    let mut top_ads: Vec<AdPerformance> = banners
        .iter()
        .map(|banner| {
            let counts = per_ad.get(banner.id.as_str()).copied().unwrap_or_default();
            AdPerformance {
                ad_id: banner.id.clone(),
                title: banner.title.clone(),
                views: counts.views,
                clicks: counts.clicks,
                ctr: ctr(counts.clicks, counts.views),
            }
        })
        .collect();
    top_ads.sort_by(|a, b| {
        b.ctr
            .total_cmp(&a.ctr)
            .then(b.views.cmp(&a.views))
            .then_with(|| a.title.cmp(&b.title))
    });
    top_ads.truncate(TOP_ADS);

    let mut zone_stats: Vec<ZonePerformance> = per_zone
        .into_iter()
        .map(|(zone, counts)| ZonePerformance {
            zone: zone.to_string(),
            views: counts.views,
            clicks: counts.clicks,
            ctr: ctr(counts.clicks, counts.views),
        })
        .collect();
    zone_stats.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.zone.cmp(&b.zone)));

    AdStats {
        total_ads: banners.len() as u64,
        active_ads: banners.iter().filter(|b| b.is_active).count() as u64,
        total_views: totals.views,
        total_clicks: totals.clicks,
        overall_ctr: ctr(totals.clicks, totals.views),
        top_ads,
        zone_stats,
    }
}
