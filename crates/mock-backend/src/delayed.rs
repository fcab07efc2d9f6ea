//! Delayed backend - wraps another backend with artificial latency.

use std::time::Duration;

use astro_core::{Backend, BackendError, Filter, Query};
use async_trait::async_trait;
use serde_json::Value;
use tokio::time::sleep;

/// A backend that wraps another backend and delays every call.
///
/// Useful for testing overlapping requests and timeouts.
pub struct DelayedBackend<B: Backend> {
    inner: B,
    delay: Duration,
}

impl<B: Backend> DelayedBackend<B> {
    /// Create a new DelayedBackend wrapping the given backend with the specified delay.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a backend with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Access the wrapped backend (e.g. to inspect recorded calls).
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: Backend> Backend for DelayedBackend<B> {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        sleep(self.delay).await;
        self.inner.select(query).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        sleep(self.delay).await;
        self.inner.insert(table, row).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        sleep(self.delay).await;
        self.inner.update(table, filters, patch).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, BackendError> {
        sleep(self.delay).await;
        self.inner.delete(table, filters).await
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<Value, BackendError> {
        sleep(self.delay).await;
        self.inner.rpc(function, params).await
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<Value, BackendError> {
        sleep(self.delay).await;
        self.inner.invoke(function, body).await
    }

    fn name(&self) -> &str {
        "DelayedBackend"
    }
}
