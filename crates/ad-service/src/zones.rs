//! Built-in placements used when the zone table cannot be read.

use astro_core::AdZone;

fn zone(name: &str, display_name: &str, description: &str, width: u32, height: u32) -> AdZone {
    AdZone {
        id: None,
        name: name.to_string(),
        display_name: display_name.to_string(),
        description: Some(description.to_string()),
        max_width: Some(width),
        max_height: Some(height),
        is_active: true,
    }
}

/// The placements every page layout knows about.
pub fn default_zones() -> Vec<AdZone> {
    vec![
        zone("homepage-hero", "Homepage Hero", "Wide banner under the landing header", 1200, 400),
        zone("sidebar", "Sidebar", "Tall unit beside chart and report pages", 300, 600),
        zone("dashboard-top", "Dashboard Top", "Leaderboard above the dashboard", 728, 90),
        zone("report-footer", "Report Footer", "Banner after report content", 728, 90),
        zone("mobile-banner", "Mobile Banner", "Small banner on narrow screens", 320, 50),
    ]
}
