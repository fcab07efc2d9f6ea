//! Row models for every table the data layer touches.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Birth charts
// ---------------------------------------------------------------------------

/// Where a person was born.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BirthLocation {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    pub country: String,
}

/// One planet placed in the zodiac.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    pub planet: String,
    pub sign: String,
    /// Degree within the sign, `0.0..30.0`.
    pub degree: f64,
    /// House number, `1..=12`.
    pub house: u8,
}

/// An angular relationship between two planets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub planet1: String,
    pub planet2: String,
    pub aspect_type: String,
    /// Exact angle of the aspect in degrees (0, 60, 90, 120, 180).
    pub angle: f64,
    /// Deviation from exact, `0.0..8.0`.
    pub orb: f64,
}

/// House cusp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub number: u8,
    pub sign: String,
    pub degree: f64,
}

/// Elemental balance as percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ElementBalance {
    pub fire: f64,
    pub earth: f64,
    pub air: f64,
    pub water: f64,
}

impl ElementBalance {
    /// Name of the element with the highest share.
    pub fn dominant(&self) -> &'static str {
        let mut best = ("fire", self.fire);
        for candidate in [("earth", self.earth), ("air", self.air), ("water", self.water)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.fire, self.earth, self.air, self.water]
    }
}

/// Modal balance as percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ModalityBalance {
    pub cardinal: f64,
    pub fixed: f64,
    pub mutable: f64,
}

/// Computed (or placeholder) chart contents stored as a JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartData {
    pub planets: Vec<PlanetPosition>,
    pub aspects: Vec<Aspect>,
    pub houses: Vec<House>,
    pub elements: ElementBalance,
    pub modalities: ModalityBalance,
}

impl ChartData {
    /// Position of a named planet, if present.
    pub fn planet(&self, name: &str) -> Option<&PlanetPosition> {
        self.planets
            .iter()
            .find(|p| p.planet.eq_ignore_ascii_case(name))
    }
}

/// A stored birth chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthChart {
    pub id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    /// Local time of birth, `HH:MM` or `HH:MM:SS`.
    pub birth_time: String,
    pub birth_location: BirthLocation,
    #[serde(default)]
    pub chart_data: ChartData,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Form input for creating a birth chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBirthChart {
    pub name: String,
    pub birth_date: NaiveDate,
    pub birth_time: String,
    pub birth_location: BirthLocation,
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Kind of astrology report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Natal,
    Vedic,
    Transit,
    Compatibility,
    SolarReturn,
    Progression,
    #[serde(other)]
    Other,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Natal => "natal",
            Self::Vedic => "vedic",
            Self::Transit => "transit",
            Self::Compatibility => "compatibility",
            Self::SolarReturn => "solar_return",
            Self::Progression => "progression",
            Self::Other => "other",
        }
    }

    /// Title-cased label for headings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Natal => "Natal Chart",
            Self::Vedic => "Vedic",
            Self::Transit => "Transit",
            Self::Compatibility => "Compatibility",
            Self::SolarReturn => "Solar Return",
            Self::Progression => "Progression",
            Self::Other => "Astrology",
        }
    }
}

/// A generated report attached to one birth chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstrologyReport {
    pub id: String,
    pub title: String,
    pub report_type: ReportType,
    pub birth_chart_id: String,
    pub user_id: String,
    /// Markdown body.
    pub content: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub template_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a report row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub title: String,
    pub report_type: ReportType,
    pub birth_chart_id: String,
    pub user_id: String,
    pub content: String,
    pub is_premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

/// A pairing of two birth charts with a stored score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub id: String,
    pub user_id: String,
    pub chart1_id: String,
    pub chart2_id: String,
    /// Score in `0.0..=100.0`.
    pub compatibility_score: f64,
    #[serde(default)]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One ordered section of a report template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSection {
    pub name: String,
    /// Static body; generated filler is used when absent.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub order: i32,
}

/// Server-defined report template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    pub report_type: ReportType,
    #[serde(default)]
    pub sections: Vec<TemplateSection>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ReportTemplate {
    /// Sections in display order.
    pub fn ordered_sections(&self) -> Vec<&TemplateSection> {
        let mut sections: Vec<&TemplateSection> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }
}

/// Grouping for templates in the template picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

// ---------------------------------------------------------------------------
// Ads
// ---------------------------------------------------------------------------

/// How an ad's `content` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdType {
    Image,
    Svg,
    Html,
    Text,
}

/// An ad banner row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdBanner {
    pub id: String,
    pub title: String,
    pub ad_type: AdType,
    pub content: String,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AdBanner {
    /// Whether the banner is active and inside its scheduling window at `now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.map_or(true, |start| start <= now)
            && self.end_date.map_or(true, |end| end >= now)
    }
}

/// Insert payload for an ad banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAdBanner {
    pub title: String,
    pub ad_type: AdType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update for an ad banner; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdBannerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_type: Option<AdType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// A named ad placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdZone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Ad interaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdEventType {
    View,
    Click,
}

impl AdEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
        }
    }
}

/// One row of the append-only analytics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdAnalytics {
    pub id: String,
    pub ad_banner_id: String,
    pub event_type: AdEventType,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Inclusive time window for analytics queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Per-ad totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdPerformance {
    pub ad_id: String,
    pub title: String,
    pub views: u64,
    pub clicks: u64,
    /// Click-through rate in percent, two decimals.
    pub ctr: f64,
}

/// Per-zone totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePerformance {
    pub zone: String,
    pub views: u64,
    pub clicks: u64,
    pub ctr: f64,
}

/// Aggregated ad statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdStats {
    pub total_ads: u64,
    pub active_ads: u64,
    pub total_views: u64,
    pub total_clicks: u64,
    pub overall_ctr: f64,
    pub top_ads: Vec<AdPerformance>,
    pub zone_stats: Vec<ZonePerformance>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_report_type_decodes_as_other() {
        let t: ReportType = serde_json::from_value(json!("horary")).unwrap();
        assert_eq!(t, ReportType::Other);
        let t: ReportType = serde_json::from_value(json!("solar_return")).unwrap();
        assert_eq!(t, ReportType::SolarReturn);
    }

    #[test]
    fn test_banner_update_skips_unset_fields() {
        let update = AdBannerUpdate {
            priority: Some(7),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"priority": 7}));
    }

    #[test]
    fn test_banner_live_window() {
        let now = Utc::now();
        let banner: AdBanner = serde_json::from_value(json!({
            "id": "ad-1",
            "title": "Spring",
            "ad_type": "text",
            "content": "Hello",
            "end_date": (now - chrono::Duration::days(1)).to_rfc3339(),
            "created_at": now.to_rfc3339(),
        }))
        .unwrap();
        assert!(banner.is_active);
        assert!(!banner.is_live_at(now));
    }

    #[test]
    fn test_dominant_element() {
        let balance = ElementBalance {
            fire: 10.0,
            earth: 20.0,
            air: 40.0,
            water: 30.0,
        };
        assert_eq!(balance.dominant(), "air");
    }
}
