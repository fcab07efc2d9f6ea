//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use ad_service::AdServiceConfig;
use report_export::ExportConfig;
use supabase_rest::{SupabaseConfig, SupabaseError};

/// Admin web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// Supabase project the admin works against.
    pub supabase: SupabaseConfig,
    /// Ad cache tuning.
    pub ads: AdServiceConfig,
    /// PDF export tuning.
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ADMIN_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SUPABASE_URL` | Project URL | (required) |
    /// | `SUPABASE_ANON_KEY` | API key | (required) |
    /// | `AD_CACHE_TTL_SECS` | Zone ad cache TTL | `300` |
    /// | `ZONE_CACHE_TTL_SECS` | Zone list cache TTL | `600` |
    /// | `PDF_WATCHDOG_SECS` | PDF export cutoff | `20` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("ADMIN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        Ok(Self {
            addr,
            supabase: SupabaseConfig::from_env()?,
            ads: AdServiceConfig::from_env(),
            export: ExportConfig::from_env(),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ADMIN_ADDR format")]
    InvalidAddr,

    #[error(transparent)]
    Supabase(#[from] SupabaseError),
}
