//! PostgREST-shaped query builder.
//!
//! Queries are plain data: the REST client encodes them as URL parameters and
//! the in-memory backend evaluates them with [`Query::apply`]. Both paths
//! share [`Filter::matches`] and [`compare_values`] so ordering and filtering
//! agree everywhere.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

/// A single row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column <> value`
    Neq(String, Value),
    /// `column >= value`
    Gte(String, Value),
    /// `column <= value`
    Lte(String, Value),
    /// `column IN (values)`
    In(String, Vec<Value>),
    /// `column IS NULL`
    IsNull(String),
}

impl Filter {
    /// Column the filter applies to.
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _)
            | Filter::Neq(c, _)
            | Filter::Gte(c, _)
            | Filter::Lte(c, _)
            | Filter::In(c, _)
            | Filter::IsNull(c) => c,
        }
    }

    /// Evaluate the filter against a JSON row.
    ///
    /// Missing columns behave like SQL NULL: only `IsNull` matches them.
    pub fn matches(&self, row: &Value) -> bool {
        let field = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::IsNull(_) => field.is_null(),
            _ if field.is_null() => false,
            Filter::Eq(_, v) => compare_values(field, v) == Ordering::Equal,
            Filter::Neq(_, v) => compare_values(field, v) != Ordering::Equal,
            Filter::Gte(_, v) => compare_values(field, v) != Ordering::Less,
            Filter::Lte(_, v) => compare_values(field, v) != Ordering::Greater,
            Filter::In(_, values) => values
                .iter()
                .any(|v| compare_values(field, v) == Ordering::Equal),
        }
    }
}

/// Sort key for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A select query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl Query {
    /// Start a `select *` query on `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the returned columns (comma-separated).
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    pub fn neq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Neq(column.into(), value.into()));
        self
    }

    pub fn gte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Gte(column.into(), value.into()));
        self
    }

    pub fn lte(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Lte(column.into(), value.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Filter::In(
            column.into(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.filters.push(Filter::IsNull(column.into()));
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &str {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[Order] {
        &self.order
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Evaluate the query over an in-memory table.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Value>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut matched: Vec<Value> = rows
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if !self.order.is_empty() {
            matched.sort_by(|a, b| {
                for key in &self.order {
                    let left = a.get(&key.column).unwrap_or(&Value::Null);
                    let right = b.get(&key.column).unwrap_or(&Value::Null);
                    let ord = compare_values(left, right);
                    let ord = if key.ascending { ord } else { ord.reverse() };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }

        if self.columns.trim() != "*" {
            let wanted: Vec<&str> = self.columns.split(',').map(str::trim).collect();
            for row in &mut matched {
                if let Value::Object(map) = row {
                    map.retain(|k, _| wanted.contains(&k.as_str()));
                }
            }
        }

        matched
    }
}

/// Total order over JSON scalars, following Postgres conventions.
///
/// NULL sorts after every other value. Strings that both parse as RFC 3339
/// timestamps are compared as instants.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => match (parse_timestamp(x), parse_timestamp(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        // Mixed types: fall back to their textual form.
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": "a", "priority": 1, "created_at": "2024-01-01T00:00:00Z"}),
            json!({"id": "b", "priority": 5, "created_at": "2024-01-02T00:00:00Z"}),
            json!({"id": "c", "priority": 3, "created_at": "2024-01-03T00:00:00Z", "zone": null}),
        ]
    }

    #[test]
    fn test_order_desc_then_limit() {
        let q = Query::table("t").order_desc("priority").limit(2);
        let out = q.apply(&rows());
        let ids: Vec<_> = out.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_timestamp_range_filters() {
        let q = Query::table("t")
            .gte("created_at", "2024-01-02T00:00:00+00:00")
            .lte("created_at", "2024-01-02T23:59:59Z");
        let out = q.apply(&rows());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], "b");
    }

    #[test]
    fn test_in_and_is_null() {
        let q = Query::table("t").in_list("id", ["a", "c"]);
        assert_eq!(q.apply(&rows()).len(), 2);

        // Missing and explicit null both count as NULL
        let q = Query::table("t").is_null("zone");
        assert_eq!(q.apply(&rows()).len(), 3);
    }

    #[test]
    fn test_null_sorts_last_ascending() {
        let data = vec![json!({"n": null}), json!({"n": 2}), json!({"n": 1})];
        let out = Query::table("t").order_asc("n").apply(&data);
        assert_eq!(out[0]["n"], 1);
        assert!(out[2]["n"].is_null());
    }

    #[test]
    fn test_column_projection() {
        let out = Query::table("t").select("id, priority").apply(&rows());
        assert!(out[0].get("created_at").is_none());
        assert_eq!(out[0]["priority"], 1);
    }
}
