//! Mock backend implementations for testing the astrology data layer.
//!
//! This crate provides implementations of the `Backend` trait for tests:
//! - `MemoryBackend` - Tables of JSON rows with PostgREST-compatible filtering
//! - `FailingBackend` - Fails every call
//! - `DelayedBackend` - Wraps another backend with artificial latency
//!
//! For production use, see the `supabase-rest` crate.
//!
//! # Example
//!
//! ```rust
//! use astro_core::{tables, Backend, Query};
//! use mock_backend::MemoryBackend;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), astro_core::BackendError> {
//!     let backend = MemoryBackend::new();
//!     backend.insert(tables::AD_ZONES, json!({"name": "sidebar"})).await?;
//!
//!     let rows = backend.select(&Query::table(tables::AD_ZONES)).await?;
//!     assert_eq!(rows.len(), 1);
//!     assert_eq!(backend.select_count(tables::AD_ZONES), 1);
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
pub mod functions;
mod memory;

// Re-export core types for convenience
pub use astro_core::{async_trait, Backend, BackendError};

pub use delayed::DelayedBackend;
pub use failing::FailingBackend;
pub use memory::{BackendCall, FunctionHandler, MemoryBackend, Tables};
