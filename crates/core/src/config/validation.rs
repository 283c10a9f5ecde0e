//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, Region};
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

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_ttl_secs` or `search_cache_ttl_secs` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_download_bytes` is 0 or exceeds 1GB
    /// - `user_agent`, `graph_base_url` or `authority_base_url` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid { field: "cache_ttl_secs".into(), reason: "must be greater than 0".into() });
        }
        if self.search_cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "search_cache_ttl_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_download_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_download_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_download_bytes > 1024 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_download_bytes".into(), reason: "must not exceed 1GB".into() });
        }

        for (field, value) in [
            ("user_agent", &self.user_agent),
            ("graph_base_url", &self.graph_base_url),
            ("authority_base_url", &self.authority_base_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }

        if self.region.parse::<Region>().is_err() {
            tracing::warn!(region = %self.region, "Invalid REGION specified; defaulting to NAM");
        }

        Ok(())
    }
}
