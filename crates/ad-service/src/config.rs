//! Ad service configuration.

use std::env;
use std::time::Duration;

/// Cache lifetimes for the ad service.
#[derive(Debug, Clone)]
pub struct AdServiceConfig {
    /// Lifetime of a cached zone ad list.
    pub ad_cache_ttl: Duration,
    /// Lifetime of the cached zone list.
    pub zone_cache_ttl: Duration,
    /// Upper bound on cached zone ad lists.
    pub max_cached_queries: u64,
}

impl Default for AdServiceConfig {
    fn default() -> Self {
        Self {
            ad_cache_ttl: Duration::from_secs(5 * 60),
            zone_cache_ttl: Duration::from_secs(10 * 60),
            max_cached_queries: 1_000,
        }
    }
}

impl AdServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `AD_CACHE_TTL_SECS` - Ad list cache lifetime (default: 300)
    /// - `ZONE_CACHE_TTL_SECS` - Zone list cache lifetime (default: 600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |name: &str| {
            env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        Self {
            ad_cache_ttl: secs("AD_CACHE_TTL_SECS").unwrap_or(defaults.ad_cache_ttl),
            zone_cache_ttl: secs("ZONE_CACHE_TTL_SECS").unwrap_or(defaults.zone_cache_ttl),
            ..defaults
        }
    }

    pub fn with_ttls(mut self, ads: Duration, zones: Duration) -> Self {
        self.ad_cache_ttl = ads;
        self.zone_cache_ttl = zones;
        self
    }
}
