//! Failing backend - every call returns an error.

use astro_core::{Backend, BackendError, Filter, Query};
use async_trait::async_trait;
use serde_json::Value;

/// A backend that is never reachable.
///
/// Useful for testing error propagation and fallback paths.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    reason: String,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self::with_reason("connection refused")
    }

    /// Fail with a custom message.
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> BackendError {
        BackendError::Unavailable(self.reason.clone())
    }
}

impl Default for FailingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for FailingBackend {
    async fn select(&self, _query: &Query) -> Result<Vec<Value>, BackendError> {
        Err(self.error())
    }

    async fn insert(&self, _table: &str, _row: Value) -> Result<Value, BackendError> {
        Err(self.error())
    }

    async fn update(
        &self,
        _table: &str,
        _filters: &[Filter],
        _patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        Err(self.error())
    }

    async fn delete(&self, _table: &str, _filters: &[Filter]) -> Result<usize, BackendError> {
        Err(self.error())
    }

    async fn rpc(&self, _function: &str, _params: Value) -> Result<Value, BackendError> {
        Err(self.error())
    }

    async fn invoke(&self, _function: &str, _body: Value) -> Result<Value, BackendError> {
        Err(self.error())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_call_fails() {
        let backend = FailingBackend::with_reason("offline");
        let err = backend.select(&Query::table("t")).await.unwrap_err();
        assert_eq!(err.to_string(), "backend unavailable: offline");
        assert!(backend.rpc("f", Value::Null).await.is_err());
    }
}
