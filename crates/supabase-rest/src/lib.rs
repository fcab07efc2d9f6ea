//! Supabase REST client library.
//!
//! This crate provides a Rust client for a Supabase project over HTTP. It
//! supports:
//!
//! - Table reads and writes through PostgREST
//! - Database function calls (`/rest/v1/rpc/<name>`)
//! - Edge function invocation (`/functions/v1/<name>`)
//!
//! [`SupabaseClient`] implements [`astro_core::Backend`], so stores and
//! services can run against it or against an in-memory backend.
//!
//! # Example
//!
//! ```no_run
//! use astro_core::{tables, Backend, Query};
//! use supabase_rest::{SupabaseClient, SupabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SupabaseConfig::from_env()?;
//! let client = SupabaseClient::new(config)?;
//!
//! let query = Query::table(tables::BIRTH_CHARTS)
//!     .eq("user_id", "c27fb365-0c84-4cf2-8555-814bb065e448")
//!     .order_desc("created_at");
//! let rows = client.select(&query).await?;
//! println!("{} charts", rows.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod params;

pub use client::SupabaseClient;
pub use config::SupabaseConfig;
pub use error::SupabaseError;
pub use params::query_params;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
