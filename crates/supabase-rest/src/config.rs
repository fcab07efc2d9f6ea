//! Configuration types for supabase-rest.

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::SupabaseError;

/// Configuration for connecting to a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://abcd.supabase.co").
    pub url: String,
    /// Public anon key sent as `apikey`.
    api_key: SecretString,
    /// Signed-in user's JWT; row-level security uses it when present.
    access_token: Option<SecretString>,
    /// Postgres schema, when not `public`.
    pub schema: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Create a new configuration with the given project URL and anon key.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key.into()),
            access_token: None,
            schema: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL` - Project URL
    /// - `SUPABASE_ANON_KEY` - Public anon key
    ///
    /// Optional:
    /// - `SUPABASE_ACCESS_TOKEN` - User JWT for row-level security
    /// - `SUPABASE_SCHEMA` - Schema name (default: public)
    /// - `SUPABASE_TIMEOUT_SECS` - Request timeout (default: 30)
    pub fn from_env() -> Result<Self, SupabaseError> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| SupabaseError::MissingEnvVar("SUPABASE_URL".to_string()))?;
        let api_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| SupabaseError::MissingEnvVar("SUPABASE_ANON_KEY".to_string()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SupabaseError::Config(format!(
                "SUPABASE_URL must be an http(s) URL, got {}",
                url
            )));
        }

        let timeout = env::var("SUPABASE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|e| SupabaseError::Config(format!("Invalid SUPABASE_TIMEOUT_SECS: {}", e)))?;

        let mut config = Self::new(url, api_key).with_timeout(Duration::from_secs(timeout));
        if let Ok(token) = env::var("SUPABASE_ACCESS_TOKEN") {
            config = config.with_access_token(token);
        }
        if let Ok(schema) = env::var("SUPABASE_SCHEMA") {
            config.schema = Some(schema);
        }
        Ok(config)
    }

    /// Attach a user access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The anon key.
    pub fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Bearer token: the user JWT if set, the anon key otherwise.
    pub fn bearer_token(&self) -> &str {
        self.access_token
            .as_ref()
            .map(|t| t.expose_secret())
            .unwrap_or_else(|| self.api_key.expose_secret())
    }

    /// Get the PostgREST base URL.
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    /// Get the URL for a table.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url(), urlencoding::encode(table))
    }

    /// Get the URL for a database function.
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rpc/{}", self.rest_url(), urlencoding::encode(function))
    }

    /// Get the URL for an edge function.
    pub fn functions_url(&self, function: &str) -> String {
        format!("{}/functions/v1/{}", self.url, urlencoding::encode(function))
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        // Local `supabase start` defaults
        Self::new("http://localhost:54321", "")
    }
}
