//! The renderable form of a report.

use astro_core::{AstrologyReport, BirthChart, ReportType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything a renderer needs, detached from storage rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub report_type: ReportType,
    /// Name on the birth chart.
    pub subject: Option<String>,
    /// "1990-05-01 14:30, London, United Kingdom"
    pub birth_details: Option<String>,
    /// Markdown body.
    pub content: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportDocument {
    /// Minimal document, mostly for tests and ad hoc exports.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            report_type: ReportType::Other,
            subject: None,
            birth_details: None,
            content: content.into(),
            generated_at: Utc::now(),
        }
    }

    pub fn from_report(report: &AstrologyReport, chart: Option<&BirthChart>) -> Self {
        Self {
            title: report.title.clone(),
            report_type: report.report_type,
            subject: chart.map(|c| c.name.clone()),
            birth_details: chart.map(|c| {
                format!(
                    "{} {}, {}, {}",
                    c.birth_date, c.birth_time, c.birth_location.city, c.birth_location.country
                )
            }),
            content: report.content.clone(),
            generated_at: Utc::now(),
        }
    }

    /// One-line description under the title.
    pub fn subtitle(&self) -> String {
        let mut parts = vec![format!("{} report", self.report_type.label())];
        if let Some(subject) = &self.subject {
            parts.push(format!("for {}", subject));
        }
        let mut line = parts.join(" ");
        if let Some(details) = &self.birth_details {
            line.push_str(" - ");
            line.push_str(details);
        }
        line
    }
}
