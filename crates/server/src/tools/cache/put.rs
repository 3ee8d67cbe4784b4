//! cache_put tool implementation.
//!
//! Stores a value under a query and namespace.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tiercache_core::{CacheFacade, cache::compute_fingerprint};

use super::{default_namespace, json_result};
use crate::error::ToolError;

/// Parameters for the cache_put tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePutParams {
    /// The raw query to cache the value under.
    pub query: String,

    /// The serialized payload to cache. Must not be empty.
    pub value: String,

    /// Cache namespace (default "default").
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Lifetime in seconds; omitted or 0 uses the configured default.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

/// Output from the cache_put tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePutOutput {
    /// Fingerprint the value was stored under.
    pub fingerprint: String,
}

/// Implementation of the cache_put tool.
pub async fn put_impl(cache: &CacheFacade, params: CachePutParams) -> Result<CallToolResult, McpError> {
    if params.value.is_empty() {
        return Err(ToolError::InvalidInput("value cannot be empty".into()).into());
    }

    let fingerprint = compute_fingerprint(&params.query, &params.namespace);
    if !cache
        .put(&params.query, params.value, &params.namespace, params.ttl_seconds)
        .await
    {
        return Err(ToolError::CacheError(format!("failed to store value for {}", params.query)).into());
    }

    json_result(&CachePutOutput { fingerprint: fingerprint.to_string() })
}
