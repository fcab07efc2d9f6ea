//! Typed row helpers over a [`Backend`].
//!
//! These mirror the per-entity CRUD functions of a SQL layer: callers pass the
//! backend handle and get decoded models back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::Backend;
use crate::error::{BackendError, Result};
use crate::query::{Filter, Query};

/// Run a query and decode every row.
pub async fn fetch_all<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Query,
) -> Result<Vec<T>> {
    let rows = backend.select(query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

/// Fetch exactly one row, failing with `NotFound` when nothing matches.
pub async fn fetch_one<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Query,
    entity: &'static str,
    id: &str,
) -> Result<T> {
    let row = backend
        .select(&query.clone().limit(1))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound {
            entity,
            id: id.to_string(),
        })?;
    Ok(serde_json::from_value(row)?)
}

/// Fetch a row by its `id` column.
pub async fn fetch_by_id<T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    entity: &'static str,
    id: &str,
) -> Result<T> {
    fetch_one(backend, &Query::table(table).eq("id", id), entity, id).await
}

/// Insert a payload and decode the stored row.
pub async fn insert_row<P: Serialize + ?Sized, T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    payload: &P,
) -> Result<T> {
    let row = backend.insert(table, serde_json::to_value(payload)?).await?;
    Ok(serde_json::from_value(row)?)
}

/// Patch the row with the given `id`, failing with `NotFound` when it is gone.
pub async fn update_by_id<P: Serialize + ?Sized, T: DeserializeOwned>(
    backend: &dyn Backend,
    table: &str,
    entity: &'static str,
    id: &str,
    patch: &P,
) -> Result<T> {
    let filters = [Filter::Eq("id".to_string(), Value::from(id))];
    let row = backend
        .update(table, &filters, serde_json::to_value(patch)?)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound {
            entity,
            id: id.to_string(),
        })?;
    Ok(serde_json::from_value(row)?)
}

/// Delete the row with the given `id`, failing with `NotFound` when nothing was removed.
pub async fn delete_by_id(
    backend: &dyn Backend,
    table: &str,
    entity: &'static str,
    id: &str,
) -> Result<()> {
    let filters = [Filter::Eq("id".to_string(), Value::from(id))];
    let removed = backend.delete(table, &filters).await?;
    if removed == 0 {
        return Err(BackendError::NotFound {
            entity,
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Call a database function and decode its result.
pub async fn call_rpc<P: Serialize + ?Sized, T: DeserializeOwned>(
    backend: &dyn Backend,
    function: &str,
    params: &P,
) -> Result<T> {
    let value = backend.rpc(function, serde_json::to_value(params)?).await?;
    Ok(serde_json::from_value(value)?)
}
