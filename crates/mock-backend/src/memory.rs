//! In-memory backend - tables of JSON rows.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use astro_core::{Backend, BackendError, Filter, Query};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tracing::debug;

/// Table name to rows.
pub type Tables = HashMap<String, Vec<Value>>;

/// A registered database or edge function.
///
/// Handlers get exclusive access to every table for the duration of the call,
/// like a function running inside a transaction.
pub type FunctionHandler =
    Arc<dyn Fn(&mut Tables, &Value) -> Result<Value, BackendError> + Send + Sync>;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Select(String),
    Insert(String),
    Update(String),
    Delete(String),
    Rpc(String),
    Invoke(String),
}

/// A backend that keeps every table in memory and records each call.
///
/// Useful for exercising stores and services without a Supabase project.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    rpcs: HashMap<String, FunctionHandler>,
    edge_functions: HashMap<String, FunctionHandler>,
    calls: Mutex<Vec<BackendCall>>,
    failing_tables: Mutex<HashSet<String>>,
}

impl MemoryBackend {
    /// Create an empty backend with no functions registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with the ad RPC functions registered.
    pub fn with_ad_functions() -> Self {
        Self::new()
            .with_rpc(
                astro_core::rpc::GET_ACTIVE_ADS_FOR_ZONE,
                crate::functions::get_active_ads_for_zone,
            )
            .with_rpc(astro_core::rpc::TRACK_AD_EVENT, crate::functions::track_ad_event)
    }

    /// Register a database function.
    pub fn with_rpc<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Tables, &Value) -> Result<Value, BackendError> + Send + Sync + 'static,
    {
        self.rpcs.insert(name.into(), Arc::new(handler));
        self
    }

    /// Register an edge function.
    pub fn with_function<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Tables, &Value) -> Result<Value, BackendError> + Send + Sync + 'static,
    {
        self.edge_functions.insert(name.into(), Arc::new(handler));
        self
    }

    /// Append rows to a table as-is (no generated columns).
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        lock(&self.tables)
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.tables).get(table).cloned().unwrap_or_default()
    }

    /// Make every call touching `table` fail until [`recover_table`](Self::recover_table).
    pub fn fail_table(&self, table: &str) {
        lock(&self.failing_tables).insert(table.to_string());
    }

    pub fn recover_table(&self, table: &str) {
        lock(&self.failing_tables).remove(table);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    /// Number of selects issued against `table`.
    pub fn select_count(&self, table: &str) -> usize {
        self.count(|c| matches!(c, BackendCall::Select(t) if t == table))
    }

    /// Number of calls to the database function `name`.
    pub fn rpc_count(&self, name: &str) -> usize {
        self.count(|c| matches!(c, BackendCall::Rpc(f) if f == name))
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: BackendCall) {
        debug!("MemoryBackend call: {:?}", call);
        lock(&self.calls).push(call);
    }

    fn check_table(&self, table: &str) -> Result<(), BackendError> {
        if lock(&self.failing_tables).contains(table) {
            return Err(BackendError::Unavailable(format!(
                "table {} is failing",
                table
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        self.record(BackendCall::Select(query.table_name().to_string()));
        self.check_table(query.table_name())?;

        let tables = lock(&self.tables);
        Ok(match tables.get(query.table_name()) {
            Some(rows) => query.apply(rows),
            None => Vec::new(),
        })
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value, BackendError> {
        self.record(BackendCall::Insert(table.to_string()));
        self.check_table(table)?;

        let map = row
            .as_object_mut()
            .ok_or_else(|| BackendError::Constraint("row must be a JSON object".to_string()))?;

        let now = now_timestamp();
        map.entry("id")
            .or_insert_with(|| Value::from(uuid::Uuid::new_v4().to_string()));
        map.entry("created_at").or_insert_with(|| Value::from(now.clone()));
        map.entry("updated_at").or_insert_with(|| Value::from(now));

        let mut tables = lock(&self.tables);
        let rows = tables.entry(table.to_string()).or_default();
        if let Some(id) = row.get("id") {
            if rows.iter().any(|r| r.get("id") == Some(id)) {
                return Err(BackendError::Constraint(format!(
                    "duplicate key id={} in {}",
                    id, table
                )));
            }
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        self.record(BackendCall::Update(table.to_string()));
        self.check_table(table)?;

        let patch = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(BackendError::Constraint(
                    "patch must be a JSON object".to_string(),
                ))
            }
        };

        let mut tables = lock(&self.tables);
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !filters.iter().all(|f| f.matches(row)) {
                    continue;
                }
                if let Value::Object(map) = row {
                    for (k, v) in &patch {
                        map.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, BackendError> {
        self.record(BackendCall::Delete(table.to_string()));
        self.check_table(table)?;

        let mut tables = lock(&self.tables);
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok(before - rows.len())
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<Value, BackendError> {
        self.record(BackendCall::Rpc(function.to_string()));
        self.check_table(function)?;

        let handler = self
            .rpcs
            .get(function)
            .cloned()
            .ok_or_else(|| BackendError::UnknownFunction(function.to_string()))?;
        let mut tables = lock(&self.tables);
        handler(&mut *tables, &params)
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<Value, BackendError> {
        self.record(BackendCall::Invoke(function.to_string()));
        self.check_table(function)?;

        let handler = self
            .edge_functions
            .get(function)
            .cloned()
            .ok_or_else(|| BackendError::UnknownFunction(function.to_string()))?;
        let mut tables = lock(&self.tables);
        handler(&mut *tables, &body)
    }

    fn name(&self) -> &str {
        "MemoryBackend"
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = lock(&self.tables);
        let mut names: Vec<&String> = tables.keys().collect();
        names.sort();
        f.debug_struct("MemoryBackend")
            .field("tables", &names)
            .field("rpcs", &self.rpcs.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
