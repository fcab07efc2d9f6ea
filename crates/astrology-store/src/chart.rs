//! Placeholder chart generation.
//!
//! There is no ephemeris behind this: positions are drawn at random with the
//! same shape and ranges a computed chart would have, so downstream consumers
//! (report content, compatibility scoring) work unchanged. The elemental and
//! modal balance are derived from the drawn planet signs.

use astro_core::{Aspect, ChartData, ElementBalance, House, ModalityBalance, PlanetPosition};
use rand::seq::SliceRandom;
use rand::Rng;

pub const PLANETS: [&str; 10] = [
    "Sun", "Moon", "Mercury", "Venus", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto",
];

pub const SIGNS: [&str; 12] = [
    "Aries",
    "Taurus",
    "Gemini",
    "Cancer",
    "Leo",
    "Virgo",
    "Libra",
    "Scorpio",
    "Sagittarius",
    "Capricorn",
    "Aquarius",
    "Pisces",
];

/// Major aspects and their exact angles.
pub const ASPECTS: [(&str, f64); 5] = [
    ("conjunction", 0.0),
    ("sextile", 60.0),
    ("square", 90.0),
    ("trine", 120.0),
    ("opposition", 180.0),
];

/// Chance that any given planet pair forms an aspect.
pub const ASPECT_PROBABILITY: f64 = 0.3;

pub const MAX_ORB: f64 = 8.0;

/// Zero-based position of a sign in the zodiac.
pub fn sign_index(sign: &str) -> Option<usize> {
    SIGNS.iter().position(|s| s.eq_ignore_ascii_case(sign))
}

/// Fire, earth, air or water.
pub fn sign_element(sign: &str) -> Option<&'static str> {
    sign_index(sign).map(|i| ["fire", "earth", "air", "water"][i % 4])
}

/// Cardinal, fixed or mutable.
pub fn sign_modality(sign: &str) -> Option<&'static str> {
    sign_index(sign).map(|i| ["cardinal", "fixed", "mutable"][i % 3])
}

/// Ecliptic longitude in `0.0..360.0`.
pub fn longitude(position: &PlanetPosition) -> Option<f64> {
    sign_index(&position.sign).map(|i| i as f64 * 30.0 + position.degree)
}

/// Two decimals, rounding down so values stay inside half-open ranges.
fn trunc2(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Draw a complete placeholder chart.
pub fn generate_chart_data<R: Rng + ?Sized>(rng: &mut R) -> ChartData {
    let planets: Vec<PlanetPosition> = PLANETS
        .iter()
        .map(|planet| PlanetPosition {
            planet: planet.to_string(),
            sign: random_sign(rng),
            degree: trunc2(rng.gen_range(0.0..30.0)),
            house: rng.gen_range(1..=12),
        })
        .collect();

    let mut aspects = Vec::new();
    for (i, first) in PLANETS.iter().enumerate() {
        for second in &PLANETS[i + 1..] {
            if rng.gen_bool(ASPECT_PROBABILITY) {
                let (aspect_type, angle) = ASPECTS[rng.gen_range(0..ASPECTS.len())];
                aspects.push(Aspect {
                    planet1: first.to_string(),
                    planet2: second.to_string(),
                    aspect_type: aspect_type.to_string(),
                    angle,
                    orb: trunc2(rng.gen_range(0.0..MAX_ORB)),
                });
            }
        }
    }

    let houses = (1..=12)
        .map(|number| House {
            number,
            sign: random_sign(rng),
            degree: trunc2(rng.gen_range(0.0..30.0)),
        })
        .collect();

    let (elements, modalities) = balance(&planets);

    ChartData {
        planets,
        aspects,
        houses,
        elements,
        modalities,
    }
}

fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> String {
    SIGNS.choose(rng).copied().unwrap_or("Aries").to_string()
}

/// Percentage of planets in each element and modality.
pub fn balance(planets: &[PlanetPosition]) -> (ElementBalance, ModalityBalance) {
    let mut elements = ElementBalance::default();
    let mut modalities = ModalityBalance::default();
    if planets.is_empty() {
        return (elements, modalities);
    }

    let share = 100.0 / planets.len() as f64;
    for planet in planets {
        match sign_element(&planet.sign) {
            Some("fire") => elements.fire += share,
            Some("earth") => elements.earth += share,
            Some("air") => elements.air += share,
            Some("water") => elements.water += share,
            _ => {}
        }
        match sign_modality(&planet.sign) {
            Some("cardinal") => modalities.cardinal += share,
            Some("fixed") => modalities.fixed += share,
            Some("mutable") => modalities.mutable += share,
            _ => {}
        }
    }

    elements.fire = round1(elements.fire);
    elements.earth = round1(elements.earth);
    elements.air = round1(elements.air);
    elements.water = round1(elements.water);
    modalities.cardinal = round1(modalities.cardinal);
    modalities.fixed = round1(modalities.fixed);
    modalities.mutable = round1(modalities.mutable);

    (elements, modalities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_chart_shape_and_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let chart = generate_chart_data(&mut rng);

        assert_eq!(chart.planets.len(), 10);
        assert_eq!(chart.houses.len(), 12);
        for planet in &chart.planets {
            assert!(sign_index(&planet.sign).is_some());
            assert!((0.0..30.0).contains(&planet.degree));
            assert!((1..=12).contains(&planet.house));
        }
        for aspect in &chart.aspects {
            assert!(aspect.orb < MAX_ORB);
            assert!(ASPECTS.iter().any(|(name, angle)| {
                *name == aspect.aspect_type && *angle == aspect.angle
            }));
        }
        assert!(chart.aspects.len() <= 45);
    }

    #[test]
    fn test_balance_sums_to_hundred() {
        let mut rng = StdRng::seed_from_u64(11);
        let chart = generate_chart_data(&mut rng);

        let elements: f64 = chart.elements.as_array().iter().sum();
        let modes = chart.modalities.cardinal + chart.modalities.fixed + chart.modalities.mutable;
        assert!((elements - 100.0).abs() < 0.5);
        assert!((modes - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_same_seed_same_chart() {
        let a = generate_chart_data(&mut StdRng::seed_from_u64(3));
        let b = generate_chart_data(&mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_lookup() {
        assert_eq!(sign_element("Leo"), Some("fire"));
        assert_eq!(sign_element("pisces"), Some("water"));
        assert_eq!(sign_modality("Taurus"), Some("fixed"));
        assert_eq!(sign_modality("Gemini"), Some("mutable"));
        assert_eq!(sign_index("Ophiuchus"), None);
    }
}
