//! Cache configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TIERCACHE_*)
//! 2. TOML config file (if TIERCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::memory::{DEFAULT_HEADROOM, DEFAULT_MAX_ITEMS};

mod validation;

pub use validation::ConfigError;

/// Cache configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TIERCACHE_*)
/// 2. TOML config file (if TIERCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path to the SQLite cache database. Parent directories are created on open.
    ///
    /// Set via TIERCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum number of entries held in the memory tier.
    ///
    /// Set via TIERCACHE_MAX_MEMORY_ITEMS environment variable.
    #[serde(default = "default_max_memory_items")]
    pub max_memory_items: usize,

    /// Extra entries dropped on each eviction pass beyond the overflow.
    ///
    /// Set via TIERCACHE_EVICTION_HEADROOM environment variable.
    #[serde(default = "default_eviction_headroom")]
    pub eviction_headroom: usize,

    /// TTL applied when a `put` does not name one.
    ///
    /// Set via TIERCACHE_DEFAULT_TTL_SECS environment variable.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/search_cache/search_cache.sqlite")
}

fn default_max_memory_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_eviction_headroom() -> usize {
    DEFAULT_HEADROOM
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_memory_items: default_max_memory_items(),
            eviction_headroom: default_eviction_headroom(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TIERCACHE_`
    /// 2. TOML file from `TIERCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("TIERCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TIERCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
