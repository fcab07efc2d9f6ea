//! The row store trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;
use crate::query::{Filter, Query};

/// A table-oriented backend (hosted Postgres behind a REST layer, or an
/// in-memory stand-in).
///
/// Rows travel as JSON objects; the typed helpers in [`crate::table`] decode
/// them into models.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run a select query and return the matching rows in query order.
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError>;

    /// Insert a row and return it as stored (with generated columns).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError>;

    /// Merge `patch` into every row matching `filters`; returns updated rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError>;

    /// Delete every row matching `filters`; returns the number removed.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, BackendError>;

    /// Call a database function.
    async fn rpc(&self, function: &str, params: Value) -> Result<Value, BackendError>;

    /// Invoke an edge function with a JSON body.
    async fn invoke(&self, function: &str, body: Value) -> Result<Value, BackendError>;

    /// Human-readable backend name for logging.
    fn name(&self) -> &str;
}
