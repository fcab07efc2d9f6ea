//! Encoding of [`Query`] values as PostgREST URL parameters.

use astro_core::{Filter, Query};
use serde_json::Value;

/// Build the query-string pairs for a select request.
///
/// Values are left raw; reqwest percent-encodes them.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), query.columns().replace(' ', ""))];
    params.extend(filter_params(query.filters()));

    if !query.ordering().is_empty() {
        let order = query
            .ordering()
            .iter()
            .map(|o| {
                format!(
                    "{}.{}",
                    o.column,
                    if o.ascending { "asc" } else { "desc" }
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }

    if let Some(limit) = query.row_limit() {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

/// Encode filters as `column=op.value` pairs (used by update/delete too).
pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| {
            let value = match f {
                Filter::Eq(_, Value::Null) => "is.null".to_string(),
                Filter::Eq(_, v) => format!("eq.{}", scalar(v)),
                Filter::Neq(_, v) => format!("neq.{}", scalar(v)),
                Filter::Gte(_, v) => format!("gte.{}", scalar(v)),
                Filter::Lte(_, v) => format!("lte.{}", scalar(v)),
                Filter::In(_, values) => format!(
                    "in.({})",
                    values.iter().map(list_item).collect::<Vec<_>>().join(",")
                ),
                Filter::IsNull(_) => "is.null".to_string(),
            };
            (f.column().to_string(), value)
        })
        .collect()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// List items containing PostgREST delimiters must be double-quoted.
fn list_item(value: &Value) -> String {
    let raw = scalar(value);
    if raw.contains([',', '(', ')', '"']) {
        format!("\"{}\"", raw.replace('"', "\\\""))
    } else {
        raw
    }
}
