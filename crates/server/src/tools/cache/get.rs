//! cache_get tool implementation.
//!
//! Retrieves a cached value by query and namespace.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tiercache_core::CacheFacade;

use super::{default_namespace, json_result};
use crate::error::ToolError;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The raw query the value was cached under. Case, quotes and extra
    /// whitespace are ignored.
    pub query: String,

    /// Cache namespace, e.g. the search engine name (default "default").
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    /// The cached value, decoded as UTF-8 (lossy).
    pub value: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheFacade, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let value = cache
        .get(&params.query, &params.namespace)
        .await
        .ok_or_else(|| ToolError::CacheMiss(params.query.clone()))?;

    json_result(&CacheGetOutput { value: String::from_utf8_lossy(&value).into_owned() })
}
