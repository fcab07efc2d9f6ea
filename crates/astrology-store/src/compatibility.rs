//! Compatibility scoring between two charts.

use astro_core::{ChartData, ElementBalance};
use serde::{Deserialize, Serialize};

use crate::chart::{longitude, ASPECTS, MAX_ORB};

/// Shared share of each element between two charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ElementalHarmony {
    pub fire: f64,
    pub earth: f64,
    pub air: f64,
    pub water: f64,
}

/// Counts of cross-chart aspects by character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AspectPatterns {
    /// Trines and sextiles.
    pub harmonious: u32,
    /// Squares and oppositions.
    pub challenging: u32,
    /// Conjunctions.
    pub neutral: u32,
}

/// Non-persisted analysis shown alongside a compatibility report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityAnalysis {
    pub score: f64,
    pub elemental_harmony: ElementalHarmony,
    pub aspect_patterns: AspectPatterns,
    pub summary: String,
}

/// Score in `0.0..=100.0` from the two elemental balances.
///
/// 60% similarity of the balances, 40% polarity match (fire/air against
/// earth/water).
pub fn compatibility_score(a: &ChartData, b: &ChartData) -> f64 {
    let (ea, eb) = (normalized(&a.elements), normalized(&b.elements));
    let distance: f64 = ea
        .iter()
        .zip(eb.iter())
        .map(|(x, y)| (x - y).abs())
        .sum();
    let similarity = 100.0 - distance / 2.0;

    let pa = ea[0] + ea[2];
    let pb = eb[0] + eb[2];
    let polarity = (pa * pb + (100.0 - pa) * (100.0 - pb)) / 100.0;

    let score = 0.6 * similarity + 0.4 * polarity;
    ((score * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

/// Balance rescaled to sum to 100, or even when empty.
fn normalized(balance: &ElementBalance) -> [f64; 4] {
    let values = balance.as_array();
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return [25.0; 4];
    }
    values.map(|v| v / total * 100.0)
}

/// One-line verdict for a score.
pub fn summary(score: f64) -> &'static str {
    match score {
        s if s >= 80.0 => "Exceptional harmony between these charts.",
        s if s >= 60.0 => "Strong compatibility with complementary energies.",
        s if s >= 40.0 => "Moderate compatibility; differences can be balanced with effort.",
        _ => "A challenging match that asks for patience and understanding.",
    }
}

/// Classify every planet pair across the two charts by the aspect they form.
pub fn aspect_patterns(a: &ChartData, b: &ChartData) -> AspectPatterns {
    let mut patterns = AspectPatterns::default();
    for pa in &a.planets {
        let Some(la) = longitude(pa) else { continue };
        for pb in &b.planets {
            let Some(lb) = longitude(pb) else { continue };
            let mut separation = (la - lb).abs() % 360.0;
            if separation > 180.0 {
                separation = 360.0 - separation;
            }
            let aspect = ASPECTS
                .iter()
                .find(|(_, angle)| (separation - angle).abs() <= MAX_ORB);
            match aspect.map(|(name, _)| *name) {
                Some("trine") | Some("sextile") => patterns.harmonious += 1,
                Some("square") | Some("opposition") => patterns.challenging += 1,
                Some("conjunction") => patterns.neutral += 1,
                _ => {}
            }
        }
    }
    patterns
}

pub fn analyze(a: &ChartData, b: &ChartData) -> CompatibilityAnalysis {
    let (ea, eb) = (normalized(&a.elements), normalized(&b.elements));
    let score = compatibility_score(a, b);
    CompatibilityAnalysis {
        score,
        elemental_harmony: ElementalHarmony {
            fire: ea[0].min(eb[0]),
            earth: ea[1].min(eb[1]),
            air: ea[2].min(eb[2]),
            water: ea[3].min(eb[3]),
        },
        aspect_patterns: aspect_patterns(a, b),
        summary: summary(score).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_core::PlanetPosition;

    fn with_elements(fire: f64, earth: f64, air: f64, water: f64) -> ChartData {
        ChartData {
            elements: ElementBalance {
                fire,
                earth,
                air,
                water,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_charts_score_high() {
        let a = with_elements(40.0, 10.0, 40.0, 10.0);
        let score = compatibility_score(&a, &a);
        assert!(score >= 80.0, "score was {}", score);
    }

    #[test]
    fn test_opposite_charts_score_low() {
        let a = with_elements(50.0, 0.0, 50.0, 0.0);
        let b = with_elements(0.0, 50.0, 0.0, 50.0);
        assert_eq!(compatibility_score(&a, &b), 0.0);
    }

    #[test]
    fn test_score_is_symmetric_and_bounded() {
        let a = with_elements(30.0, 20.0, 10.0, 40.0);
        let b = with_elements(10.0, 40.0, 30.0, 20.0);
        let ab = compatibility_score(&a, &b);
        assert_eq!(ab, compatibility_score(&b, &a));
        assert!((0.0..=100.0).contains(&ab));
    }

    #[test]
    fn test_empty_balance() {
        // Treated as an even split on both sides
        let empty = ChartData::default();
        assert_eq!(compatibility_score(&empty, &empty), 80.0);
    }

    #[test]
    fn test_aspect_patterns() {
        let planet = |sign: &str, degree: f64| PlanetPosition {
            planet: "Sun".into(),
            sign: sign.into(),
            degree,
            house: 1,
        };
        let a = ChartData {
            planets: vec![planet("Aries", 0.0)],
            ..Default::default()
        };
        let b = ChartData {
            planets: vec![
                planet("Leo", 2.0),       // trine
                planet("Cancer", 0.0),    // square
                planet("Aries", 3.0),     // conjunction
                planet("Taurus", 15.0),   // none
            ],
            ..Default::default()
        };
        assert_eq!(
            aspect_patterns(&a, &b),
            AspectPatterns {
                harmonious: 1,
                challenging: 1,
                neutral: 1
            }
        );
    }
}
