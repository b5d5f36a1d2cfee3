//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FEEDLINE_*)
//! 2. TOML config file (if FEEDLINE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::feed::{FeedFilters, FreshnessPolicy, StaticFilterResolver};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FEEDLINE_*)
/// 2. TOML config file (if FEEDLINE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Redis URL for a shared cache. When unset the SQLite cache at `db_path` is used.
    ///
    /// Set via FEEDLINE_REDIS_URL environment variable.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via FEEDLINE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Primary recommendation endpoint.
    ///
    /// Set via FEEDLINE_FEED_URL environment variable.
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Legacy/internal recommendation endpoint, used for `legacy_feed_version` only.
    ///
    /// Set via FEEDLINE_LEGACY_FEED_URL environment variable.
    #[serde(default = "default_legacy_feed_url")]
    pub legacy_feed_url: String,

    /// Feed version routed to the legacy endpoint.
    #[serde(default = "default_legacy_feed_version")]
    pub legacy_feed_version: u32,

    /// Feed version served with the tighter freshness window.
    #[serde(default = "default_realtime_feed_version")]
    pub realtime_feed_version: u32,

    /// Feed version used when a request does not name one.
    #[serde(default = "default_feed_version")]
    pub default_feed_version: u32,

    /// Page size used when a request does not name one.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Largest page size a request may ask for.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Number of ranked ids requested from upstream per generation.
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,

    /// Soft freshness window for page-1 reads, in seconds.
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,

    /// Soft freshness window for the realtime feed version, in seconds.
    #[serde(default = "default_realtime_freshness_secs")]
    pub realtime_freshness_secs: u64,

    /// Hard lifetime of cached lists and mutation markers, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Interval between expired-entry purges of the SQLite cache, in seconds.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    /// Upstream HTTP request timeout in milliseconds.
    ///
    /// Set via FEEDLINE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for upstream requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Static feed filters keyed by feed id, for running without a
    /// feed configuration service.
    #[serde(default)]
    pub feed_filters: BTreeMap<String, FeedFilters>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./feedline-cache.sqlite")
}

fn default_feed_url() -> String {
    "http://localhost:6000/feed.json".into()
}

fn default_legacy_feed_url() -> String {
    "http://localhost:6001/feed.json".into()
}

fn default_legacy_feed_version() -> u32 {
    1
}

fn default_realtime_feed_version() -> u32 {
    crate::feed::freshness::DEFAULT_REALTIME_FEED_VERSION
}

fn default_feed_version() -> u32 {
    2
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    50
}

fn default_fetch_size() -> usize {
    500
}

fn default_freshness_secs() -> u64 {
    crate::feed::freshness::DEFAULT_FRESHNESS_WINDOW.as_secs()
}

fn default_realtime_freshness_secs() -> u64 {
    crate::feed::freshness::DEFAULT_REALTIME_FRESHNESS_WINDOW.as_secs()
}

fn default_cache_ttl_secs() -> u64 {
    crate::feed::freshness::DEFAULT_CACHE_TTL.as_secs()
}

fn default_purge_interval_secs() -> u64 {
    600
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_user_agent() -> String {
    "feedline/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            db_path: default_db_path(),
            feed_url: default_feed_url(),
            legacy_feed_url: default_legacy_feed_url(),
            legacy_feed_version: default_legacy_feed_version(),
            realtime_feed_version: default_realtime_feed_version(),
            default_feed_version: default_feed_version(),
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            fetch_size: default_fetch_size(),
            freshness_secs: default_freshness_secs(),
            realtime_freshness_secs: default_realtime_freshness_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            purge_interval_secs: default_purge_interval_secs(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            feed_filters: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Soft and hard TTLs as one policy.
    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy {
            window: Duration::from_secs(self.freshness_secs),
            realtime_window: Duration::from_secs(self.realtime_freshness_secs),
            realtime_version: self.realtime_feed_version,
            hard_ttl: self.cache_ttl(),
        }
    }

    /// Resolver serving the statically configured `feed_filters`.
    pub fn filter_resolver(&self) -> StaticFilterResolver {
        StaticFilterResolver::new(self.feed_filters.clone())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FEEDLINE_`
    /// 2. TOML file from `FEEDLINE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FEEDLINE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FEEDLINE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
