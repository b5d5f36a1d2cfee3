//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn check_url(field: &str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing { field: field.into(), hint: format!("Set FEEDLINE_{}", field.to_uppercase()) });
    }
    let parsed = url::Url::parse(value).map_err(|e| invalid(field, e.to_string()))?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(invalid(field, format!("unsupported scheme: {}", parsed.scheme())));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - an endpoint is not an http(s) URL, or `redis_url` is not a redis URL
    /// - a page or fetch size is 0, or `page_size` exceeds `max_page_size`
    /// - a freshness window is 0 or not shorter than `cache_ttl_secs`
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("feed_url", &self.feed_url, &["http", "https"])?;
        check_url("legacy_feed_url", &self.legacy_feed_url, &["http", "https"])?;
        if let Some(redis_url) = &self.redis_url {
            check_url("redis_url", redis_url, &["redis", "rediss", "redis+unix"])?;
        }

        if self.page_size == 0 {
            return Err(invalid("page_size", "must be greater than 0"));
        }
        if self.max_page_size == 0 {
            return Err(invalid("max_page_size", "must be greater than 0"));
        }
        if self.page_size > self.max_page_size {
            return Err(invalid("page_size", format!("must not exceed max_page_size ({})", self.max_page_size)));
        }
        if self.fetch_size == 0 {
            return Err(invalid("fetch_size", "must be greater than 0"));
        }

        if self.cache_ttl_secs == 0 {
            return Err(invalid("cache_ttl_secs", "must be greater than 0"));
        }
        for (field, secs) in
            [("freshness_secs", self.freshness_secs), ("realtime_freshness_secs", self.realtime_freshness_secs)]
        {
            if secs == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
            if secs >= self.cache_ttl_secs {
                return Err(invalid(field, format!("must be shorter than cache_ttl_secs ({})", self.cache_ttl_secs)));
            }
        }

        if self.purge_interval_secs == 0 {
            return Err(invalid("purge_interval_secs", "must be greater than 0"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.fetch_size < self.max_page_size {
            tracing::warn!(
                fetch_size = self.fetch_size,
                max_page_size = self.max_page_size,
                "fetch_size is smaller than max_page_size; large pages will come back short"
            );
        }

        Ok(())
    }
}
