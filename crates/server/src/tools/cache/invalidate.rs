//! cache_invalidate tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tiercache_core::CacheFacade;

use super::{default_namespace, json_result};

/// Parameters for the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateParams {
    /// The raw query to drop.
    pub query: String,

    /// Cache namespace (default "default").
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Output from the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateOutput {
    /// Whether a stored entry existed.
    pub existed: bool,
}

/// Implementation of the cache_invalidate tool.
pub async fn invalidate_impl(cache: &CacheFacade, params: CacheInvalidateParams) -> Result<CallToolResult, McpError> {
    let existed = cache.invalidate(&params.query, &params.namespace).await;
    json_result(&CacheInvalidateOutput { existed })
}
