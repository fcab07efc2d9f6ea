//! Birth charts, reports and report generation for one signed-in user.
//!
//! [`AstrologyStore`] holds in-memory copies of the user's collections and is
//! the entry point for report generation and export. It talks to any
//! [`astro_core::Backend`]: Supabase in production, the in-memory backend in
//! tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use astrology_store::{AstrologyStore, ReportOptions};
//!
//! let store = AstrologyStore::new(Arc::new(backend));
//! store.fetch_birth_charts("user-1").await?;
//!
//! let report = store
//!     .create_report_from_template("template-1", "chart-1", "user-1", ReportOptions::default())
//!     .await?;
//! let pdf = store.export_report_to_pdf(&report.id).await?;
//! ```

pub mod chart;
pub mod compatibility;
pub mod content;
mod error;
mod preferences;
mod state;
mod store;

pub use compatibility::{AspectPatterns, CompatibilityAnalysis, ElementalHarmony};
pub use error::{Result, StoreError};
pub use preferences::{AccessibilitySettings, LocalPreferences};
pub use state::{AstrologyState, Collection};
pub use store::{AstrologyStore, ReportOptions};
