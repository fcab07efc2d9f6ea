//! Ad banner CRUD, cached zone lookups and event tracking.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ad_service::AdBannerService;
//! use astro_core::AdEventType;
//!
//! let ads = Arc::new(AdBannerService::new(backend));
//! let hero = ads.get_active_ads_for_zone("homepage-hero", 1).await?;
//! if let Some(ad) = hero.first() {
//!     ads.track_ad_event(&ad.id, AdEventType::View, Some("homepage-hero"), None);
//! }
//! ```

mod config;
mod error;
mod service;
pub mod stats;
mod zones;

pub use config::AdServiceConfig;
pub use error::{AdError, Result};
pub use service::AdBannerService;
pub use stats::ctr;
pub use zones::default_zones;
