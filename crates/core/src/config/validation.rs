//! Configuration validation rules.
//!
//! This module provides validation logic for `CacheConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::CacheConfig;
use thiserror::Error;

const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const MAX_HEADROOM: usize = 100_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl CacheConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `db_path` is empty
    /// - `max_memory_items` is 0
    /// - `eviction_headroom` exceeds 100000
    /// - `default_ttl_secs` is 0 or longer than a year
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "db_path".into(), reason: "must not be empty".into() });
        }

        if self.max_memory_items == 0 {
            return Err(ConfigError::Invalid {
                field: "max_memory_items".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.eviction_headroom > MAX_HEADROOM {
            return Err(ConfigError::Invalid {
                field: "eviction_headroom".into(),
                reason: format!("must not exceed {MAX_HEADROOM}"),
            });
        }

        if self.default_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "default_ttl_secs".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.default_ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "default_ttl_secs".into(),
                reason: format!("must not exceed one year ({MAX_TTL_SECS}s)"),
            });
        }

        if self.eviction_headroom >= self.max_memory_items {
            tracing::warn!(
                max_memory_items = self.max_memory_items,
                eviction_headroom = self.eviction_headroom,
                "eviction_headroom is not smaller than max_memory_items; \
                 every eviction pass will empty the memory tier"
            );
        }

        Ok(())
    }
}
