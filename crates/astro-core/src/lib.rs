//! Core types for the astrology data layer.
//!
//! This crate provides the shared interface for every backend and service in
//! the workspace. It defines:
//!
//! - [`Backend`] - The trait that every row store (Supabase, in-memory) implements
//! - [`Query`] / [`Filter`] - A small PostgREST-shaped query builder
//! - [`models`] - Birth charts, reports, templates, ad banners and analytics
//! - [`BackendError`] - Error type for backend operations
//! - [`table`] - Typed helpers for decoding rows into models
//!
//! # Example
//!
//! ```rust
//! use astro_core::{tables, Query};
//!
//! let query = Query::table(tables::BIRTH_CHARTS)
//!     .eq("user_id", "user-1")
//!     .order_desc("created_at");
//!
//! assert_eq!(query.table_name(), "birth_charts");
//! ```

mod backend;
mod error;
pub mod models;
mod query;
pub mod table;

pub use backend::Backend;
pub use error::{BackendError, Result};
pub use models::*;
pub use query::{compare_values, Filter, Order, Query};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Table names in the backing Postgres schema.
pub mod tables {
    pub const BIRTH_CHARTS: &str = "birth_charts";
    pub const ASTROLOGY_REPORTS: &str = "astrology_reports";
    pub const COMPATIBILITY_REPORTS: &str = "compatibility_reports";
    pub const REPORT_TEMPLATES: &str = "report_templates";
    pub const TEMPLATE_CATEGORIES: &str = "template_categories";
    pub const AD_BANNERS: &str = "ad_banners";
    pub const AD_ZONES: &str = "ad_zones";
    pub const AD_ANALYTICS: &str = "ad_analytics";
}

/// Database functions exposed over RPC.
pub mod rpc {
    pub const GET_ACTIVE_ADS_FOR_ZONE: &str = "get_active_ads_for_zone";
    pub const TRACK_AD_EVENT: &str = "track_ad_event";
}

/// Edge functions invoked through the functions endpoint.
pub mod functions {
    pub const CHAT_WITH_ASTROLOGER: &str = "chat-with-astrologer";
}
