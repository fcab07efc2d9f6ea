//! Markdown bodies for generated reports.

use astro_core::{BirthChart, ChartData, PlanetPosition, ReportTemplate, TemplateSection};

use crate::chart::{longitude, sign_element, SIGNS};

/// Lahiri ayanamsa, rounded.
pub const SIDEREAL_OFFSET_DEG: f64 = 24.1;

/// Body stored on a report row while its content is being generated.
pub const PLACEHOLDER_CONTENT: &str = "Generating report...";

/// Vedic names for the twelve signs, in zodiac order.
const RASHIS: [&str; 12] = [
    "Mesha",
    "Vrishabha",
    "Mithuna",
    "Karka",
    "Simha",
    "Kanya",
    "Tula",
    "Vrischika",
    "Dhanu",
    "Makara",
    "Kumbha",
    "Meena",
];

fn birth_line(chart: &BirthChart) -> String {
    format!(
        "Born {} at {} in {}, {}.",
        chart.birth_date.format("%B %-d, %Y"),
        chart.birth_time,
        chart.birth_location.city,
        chart.birth_location.country
    )
}

fn planet_sentence(chart: &ChartData, planet: &str) -> String {
    match chart.planet(planet) {
        Some(p) => format!(
            "{} in {} ({:.2} degrees), house {}",
            p.planet, p.sign, p.degree, p.house
        ),
        None => format!("{} position unavailable", planet),
    }
}

/// Generated text for a template section without static content.
pub fn section_filler(section: &str, chart: &BirthChart) -> String {
    let data = &chart.chart_data;
    let sun = data
        .planet("Sun")
        .map(|p| p.sign.as_str())
        .unwrap_or("an unknown sign");
    let moon = data
        .planet("Moon")
        .map(|p| p.sign.as_str())
        .unwrap_or("an unknown sign");

    format!(
        "This section explores {} for {}. With the Sun in {} and the Moon in {}, \
         the chart leans towards {} energy, which colours how these themes unfold.",
        section.to_lowercase(),
        chart.name,
        sun,
        moon,
        data.elements.dominant()
    )
}

/// Title, then one `##` heading per section in order.
pub fn template_content(template: &ReportTemplate, chart: &BirthChart, title: &str) -> String {
    let mut out = format!("# {}\n\n{}\n\n", title, birth_line(chart));
    if let Some(description) = &template.description {
        out.push_str(description);
        out.push_str("\n\n");
    }

    for TemplateSection { name, content, .. } in template.ordered_sections() {
        out.push_str(&format!("## {}\n\n", name));
        match content.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => out.push_str(text),
            _ => out.push_str(&section_filler(name, chart)),
        }
        out.push_str("\n\n");
    }

    out.trim_end().to_string() + "\n"
}

/// Natal chart report: big three, planets, aspects, balance.
pub fn natal_content(chart: &BirthChart, title: &str) -> String {
    let data = &chart.chart_data;
    let mut out = format!("# {}\n\n{}\n\n", title, birth_line(chart));

    out.push_str("## Overview\n\n");
    out.push_str(&format!(
        "- Sun: {}\n- Moon: {}\n- Mercury: {}\n\n",
        planet_sentence(data, "Sun"),
        planet_sentence(data, "Moon"),
        planet_sentence(data, "Mercury")
    ));

    out.push_str("## Planetary Positions\n\n");
    for p in &data.planets {
        out.push_str(&format!(
            "- **{}** in {} at {:.2} degrees, house {}\n",
            p.planet, p.sign, p.degree, p.house
        ));
    }
    out.push('\n');

    out.push_str("## Aspects\n\n");
    if data.aspects.is_empty() {
        out.push_str("No major aspects in this chart.\n\n");
    } else {
        for a in &data.aspects {
            out.push_str(&format!(
                "- {} {} {} (orb {:.2} degrees)\n",
                a.planet1, a.aspect_type, a.planet2, a.orb
            ));
        }
        out.push('\n');
    }

    out.push_str("## Elemental Balance\n\n");
    let e = &data.elements;
    out.push_str(&format!(
        "Fire {:.1}%, Earth {:.1}%, Air {:.1}%, Water {:.1}%. The dominant element is {}.\n\n",
        e.fire,
        e.earth,
        e.air,
        e.water,
        e.dominant()
    ));

    out.push_str("## Modalities\n\n");
    let m = &data.modalities;
    out.push_str(&format!(
        "Cardinal {:.1}%, Fixed {:.1}%, Mutable {:.1}%.\n",
        m.cardinal, m.fixed, m.mutable
    ));

    out
}

/// Sidereal sign and degree for a tropical position.
pub fn sidereal_position(position: &PlanetPosition) -> Option<(&'static str, f64)> {
    let tropical = longitude(position)?;
    let sidereal = (tropical - SIDEREAL_OFFSET_DEG).rem_euclid(360.0);
    let index = ((sidereal / 30.0).floor() as usize).min(11);
    Some((SIGNS[index], sidereal - index as f64 * 30.0))
}

fn rashi(sign: &str) -> &'static str {
    SIGNS
        .iter()
        .position(|s| *s == sign)
        .map(|i| RASHIS[i])
        .unwrap_or("Unknown")
}

/// Vedic report using sidereal positions.
pub fn vedic_content(chart: &BirthChart, title: &str) -> String {
    let data = &chart.chart_data;
    let mut out = format!("# {}\n\n{}\n\n", title, birth_line(chart));
    out.push_str(&format!(
        "Positions use the sidereal zodiac (ayanamsa {:.1} degrees).\n\n",
        SIDEREAL_OFFSET_DEG
    ));

    out.push_str("## Graha Positions\n\n");
    for p in &data.planets {
        match sidereal_position(p) {
            Some((sign, degree)) => out.push_str(&format!(
                "- **{}** in {} ({}) at {:.2} degrees\n",
                p.planet,
                rashi(sign),
                sign,
                degree
            )),
            None => out.push_str(&format!("- **{}** position unavailable\n", p.planet)),
        }
    }
    out.push('\n');

    out.push_str("## Moon Sign (Rashi)\n\n");
    match data.planet("Moon").and_then(sidereal_position) {
        Some((sign, _)) => out.push_str(&format!(
            "The Moon falls in {} ({}), a {} sign.\n\n",
            rashi(sign),
            sign,
            sign_element(sign).unwrap_or("unknown")
        )),
        None => out.push_str("The Moon position is unavailable.\n\n"),
    }

    out.push_str("## Houses (Bhavas)\n\n");
    for h in &data.houses {
        out.push_str(&format!("- House {}: {}\n", h.number, rashi(&h.sign)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use astro_core::{BirthLocation, ReportType};
    use chrono::{NaiveDate, Utc};

    fn chart() -> BirthChart {
        BirthChart {
            id: "c1".into(),
            name: "Luna".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            birth_time: "14:30".into(),
            birth_location: BirthLocation {
                lat: 51.5,
                lng: -0.12,
                city: "London".into(),
                country: "United Kingdom".into(),
            },
            chart_data: ChartData {
                planets: vec![
                    PlanetPosition {
                        planet: "Sun".into(),
                        sign: "Taurus".into(),
                        degree: 10.5,
                        house: 9,
                    },
                    PlanetPosition {
                        planet: "Moon".into(),
                        sign: "Aries".into(),
                        degree: 20.0,
                        house: 8,
                    },
                ],
                ..Default::default()
            },
            user_id: "u1".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_template_sections_in_order() {
        let template = ReportTemplate {
            id: "t1".into(),
            name: "Career".into(),
            description: None,
            category_id: None,
            report_type: ReportType::Natal,
            sections: vec![
                TemplateSection {
                    name: "Strengths".into(),
                    content: None,
                    order: 2,
                },
                TemplateSection {
                    name: "Introduction".into(),
                    content: Some("Welcome.".into()),
                    order: 1,
                },
            ],
            is_premium: false,
            is_active: true,
        };

        let content = template_content(&template, &chart(), "Career Report");
        assert!(content.starts_with("# Career Report\n"));
        let intro = content.find("## Introduction").unwrap();
        let strengths = content.find("## Strengths").unwrap();
        assert!(intro < strengths);
        assert!(content.contains("Welcome."));
        assert!(content.contains("the Sun in Taurus"));
    }

    #[test]
    fn test_sidereal_shift() {
        let sun = PlanetPosition {
            planet: "Sun".into(),
            sign: "Taurus".into(),
            degree: 10.5,
            house: 1,
        };
        let (sign, degree) = sidereal_position(&sun).unwrap();
        assert_eq!(sign, "Aries");
        assert!((degree - 16.4).abs() < 1e-9);

        // Wraps below 0 degrees Aries
        let moon = PlanetPosition {
            planet: "Moon".into(),
            sign: "Aries".into(),
            degree: 5.0,
            house: 1,
        };
        assert_eq!(sidereal_position(&moon).unwrap().0, "Pisces");
    }

    #[test]
    fn test_vedic_uses_rashi_names() {
        let content = vedic_content(&chart(), "Vedic");
        assert!(content.contains("## Graha Positions"));
        assert!(content.contains("Mesha (Aries)"));
    }

    #[test]
    fn test_natal_sections() {
        let content = natal_content(&chart(), "Luna Natal Chart");
        for heading in [
            "## Overview",
            "## Planetary Positions",
            "## Aspects",
            "## Elemental Balance",
        ] {
            assert!(content.contains(heading), "missing {}", heading);
        }
        assert!(content.contains("No major aspects"));
    }
}
