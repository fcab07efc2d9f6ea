//! Supabase HTTP client.

use astro_core::{Backend, BackendError, Filter, Query};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SupabaseConfig;
use crate::error::SupabaseError;
use crate::params::{filter_params, query_params};

/// PostgREST error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
    /// Edge functions report errors under `error`.
    #[serde(default)]
    error: Option<String>,
}

/// Client for a Supabase project's REST, RPC and edge-function endpoints.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Build a client; no request is sent until the first call.
    pub fn new(config: SupabaseConfig) -> Result<Self, SupabaseError> {
        if config.url.is_empty() {
            return Err(SupabaseError::Config("project URL is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(SupabaseError::Http)?;

        info!("Supabase client configured for {}", config.url);
        Ok(Self { http, config })
    }

    /// Check that the REST endpoint answers.
    pub async fn health_check(&self) -> Result<bool, SupabaseError> {
        let url = format!("{}/", self.config.rest_url());
        debug!("Health check: {}", url);
        let resp = self.authorized(self.http.get(&url)).send().await?;
        Ok(resp.status().is_success())
    }

    /// Run a select query.
    pub async fn select_rows(&self, query: &Query) -> Result<Vec<Value>, SupabaseError> {
        let url = self.config.table_url(query.table_name());
        debug!("SELECT {} ({} filters)", query.table_name(), query.filters().len());

        let resp = self
            .authorized(self.http.get(&url))
            .query(&query_params(query))
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Insert a row and return the stored representation.
    pub async fn insert_row(&self, table: &str, row: &Value) -> Result<Value, SupabaseError> {
        let url = self.config.table_url(table);
        debug!("INSERT {}", table);

        let resp = self
            .authorized(self.http.post(&url))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let mut rows: Vec<Value> = Self::decode(resp).await?;
        rows.pop().ok_or_else(|| SupabaseError::Api {
            status: 200,
            code: "PGRST_EMPTY".to_string(),
            message: format!("insert into {} returned no row", table),
        })
    }

    /// Patch matching rows and return them.
    pub async fn update_rows(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Value,
    ) -> Result<Vec<Value>, SupabaseError> {
        Self::guard_unfiltered("UPDATE", table, filters)?;
        let url = self.config.table_url(table);
        debug!("UPDATE {} ({} filters)", table, filters.len());

        let resp = self
            .authorized(self.http.patch(&url))
            .header("Prefer", "return=representation")
            .query(&filter_params(filters))
            .json(patch)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Delete matching rows and return how many were removed.
    pub async fn delete_rows(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> Result<usize, SupabaseError> {
        Self::guard_unfiltered("DELETE", table, filters)?;
        let url = self.config.table_url(table);
        debug!("DELETE {} ({} filters)", table, filters.len());

        let resp = self
            .authorized(self.http.delete(&url))
            .header("Prefer", "return=representation")
            .query(&filter_params(filters))
            .send()
            .await?;
        let rows: Vec<Value> = Self::decode(resp).await?;
        Ok(rows.len())
    }

    /// Call a database function.
    pub async fn call_function(
        &self,
        function: &str,
        params: &Value,
    ) -> Result<Value, SupabaseError> {
        let url = self.config.rpc_url(function);
        debug!("RPC {}", function);

        let resp = self
            .authorized(self.http.post(&url))
            .json(params)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SupabaseError::NotFound(function.to_string()));
        }
        Self::decode(resp).await
    }

    /// Invoke an edge function.
    pub async fn invoke_function(
        &self,
        function: &str,
        body: &Value,
    ) -> Result<Value, SupabaseError> {
        let url = self.config.functions_url(function);
        debug!("Invoke edge function {}", function);

        let resp = self
            .authorized(self.http.post(&url))
            .json(body)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SupabaseError::NotFound(function.to_string()));
        }
        Self::decode(resp).await
    }

    /// Get the configuration.
    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Get the underlying HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.http
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req
            .header("apikey", self.config.api_key())
            .bearer_auth(self.config.bearer_token());
        match &self.config.schema {
            Some(schema) => req
                .header("Accept-Profile", schema.as_str())
                .header("Content-Profile", schema.as_str()),
            None => req,
        }
    }

    /// PostgREST refuses unfiltered writes; fail early with a clearer message.
    fn guard_unfiltered(op: &str, table: &str, filters: &[Filter]) -> Result<(), SupabaseError> {
        if filters.is_empty() {
            return Err(SupabaseError::Config(format!(
                "{} on {} without filters is not allowed",
                op, table
            )));
        }
        Ok(())
    }

    async fn decode<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T, SupabaseError> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
            let (code, message) = match parsed {
                Some(err) => {
                    let mut message = err
                        .message
                        .or(err.error)
                        .unwrap_or_else(|| body.clone());
                    if let Some(details) = err.details {
                        message = format!("{} ({})", message, details);
                    }
                    if let Some(hint) = err.hint {
                        message = format!("{} hint: {}", message, hint);
                    }
                    (err.code.unwrap_or_default(), message)
                }
                None => (String::new(), body),
            };
            warn!("Supabase returned HTTP {}: {}", status, message);
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        // Functions returning void answer with an empty body
        if body.trim().is_empty() {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, BackendError> {
        Ok(self.select_rows(query).await?)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        Ok(self.insert_row(table, &row).await?)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, BackendError> {
        Ok(self.update_rows(table, filters, &patch).await?)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, BackendError> {
        Ok(self.delete_rows(table, filters).await?)
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<Value, BackendError> {
        Ok(self.call_function(function, &params).await?)
    }

    async fn invoke(&self, function: &str, body: Value) -> Result<Value, BackendError> {
        Ok(self.invoke_function(function, &body).await?)
    }

    fn name(&self) -> &str {
        "supabase"
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.config.url)
            .field("schema", &self.config.schema)
            .finish()
    }
}
