//! In-memory copies of the user's collections.

use astro_core::{
    AstrologyReport, BirthChart, CompatibilityReport, ReportTemplate, TemplateCategory,
};
use serde::Serialize;

/// The collections the store keeps, each with its own loading/error flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    BirthCharts,
    Reports,
    CompatibilityReports,
    Templates,
    TemplateCategories,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::BirthCharts,
        Collection::Reports,
        Collection::CompatibilityReports,
        Collection::Templates,
        Collection::TemplateCategories,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::BirthCharts => "birth_charts",
            Collection::Reports => "reports",
            Collection::CompatibilityReports => "compatibility_reports",
            Collection::Templates => "templates",
            Collection::TemplateCategories => "template_categories",
        }
    }
}

/// Snapshot of everything the store holds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AstrologyState {
    pub birth_charts: Vec<BirthChart>,
    pub reports: Vec<AstrologyReport>,
    pub compatibility_reports: Vec<CompatibilityReport>,
    pub templates: Vec<ReportTemplate>,
    pub template_categories: Vec<TemplateCategory>,
    pub current_chart: Option<BirthChart>,

    pub birth_charts_loading: bool,
    pub birth_charts_error: Option<String>,
    pub reports_loading: bool,
    pub reports_error: Option<String>,
    pub compatibility_reports_loading: bool,
    pub compatibility_reports_error: Option<String>,
    pub templates_loading: bool,
    pub templates_error: Option<String>,
    pub template_categories_loading: bool,
    pub template_categories_error: Option<String>,

    pub pdf_exporting: bool,
    pub pdf_error: Option<String>,
}

impl AstrologyState {
    /// Loading flag and error slot for a collection.
    pub fn status_mut(&mut self, collection: Collection) -> (&mut bool, &mut Option<String>) {
        match collection {
            Collection::BirthCharts => {
                (&mut self.birth_charts_loading, &mut self.birth_charts_error)
            }
            Collection::Reports => (&mut self.reports_loading, &mut self.reports_error),
            Collection::CompatibilityReports => (
                &mut self.compatibility_reports_loading,
                &mut self.compatibility_reports_error,
            ),
            Collection::Templates => (&mut self.templates_loading, &mut self.templates_error),
            Collection::TemplateCategories => (
                &mut self.template_categories_loading,
                &mut self.template_categories_error,
            ),
        }
    }

    pub fn error(&self, collection: Collection) -> Option<&str> {
        match collection {
            Collection::BirthCharts => self.birth_charts_error.as_deref(),
            Collection::Reports => self.reports_error.as_deref(),
            Collection::CompatibilityReports => self.compatibility_reports_error.as_deref(),
            Collection::Templates => self.templates_error.as_deref(),
            Collection::TemplateCategories => self.template_categories_error.as_deref(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.birth_charts_loading
            || self.reports_loading
            || self.compatibility_reports_loading
            || self.templates_loading
            || self.template_categories_loading
    }

    /// Reset every error slot, including the PDF one.
    pub fn clear_errors(&mut self) {
        for collection in Collection::ALL {
            *self.status_mut(collection).1 = None;
        }
        self.pdf_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_slots_are_independent() {
        let mut state = AstrologyState::default();
        *state.status_mut(Collection::Reports).1 = Some("boom".into());

        assert_eq!(state.error(Collection::Reports), Some("boom"));
        assert_eq!(state.error(Collection::BirthCharts), None);

        state.pdf_error = Some("pdf".into());
        state.clear_errors();
        assert!(Collection::ALL.iter().all(|c| state.error(*c).is_none()));
        assert!(state.pdf_error.is_none());
    }
}
