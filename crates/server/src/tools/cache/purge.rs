//! cache_purge tool implementation.
//!
//! Purges cache entries by expiry, namespace, or count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tiercache_core::CacheFacade;

use super::json_result;
use crate::error::ToolError;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Sweep entries whose TTL has elapsed.
    #[serde(default)]
    pub expired: Option<bool>,

    /// Purge every entry in this namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Keep only the N most recently accessed entries (LRU purge).
    #[serde(default)]
    pub max_entries: Option<usize>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheFacade, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let sweep = params.expired.unwrap_or(false);
    if !sweep && params.namespace.is_none() && params.max_entries.is_none() {
        return Err(ToolError::InvalidInput(
            "At least one of expired, namespace, or max_entries must be specified".to_string(),
        )
        .into());
    }

    let mut deleted_total = 0u64;

    if sweep {
        deleted_total += cache.sweep_expired().await;
    }

    if let Some(namespace) = params.namespace {
        deleted_total += cache.purge_namespace(&namespace).await;
    }

    if let Some(max_entries) = params.max_entries {
        deleted_total += cache.purge_lru(max_entries).await;
    }

    json_result(&CachePurgeOutput { deleted: deleted_total })
}
