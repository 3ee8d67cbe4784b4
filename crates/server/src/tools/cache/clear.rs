//! cache_clear tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tiercache_core::CacheFacade;

use super::json_result;
use crate::error::ToolError;

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearOutput {
    pub cleared: bool,
}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(cache: &CacheFacade) -> Result<CallToolResult, McpError> {
    if !cache.clear_all().await {
        return Err(ToolError::CacheError("failed to clear the persistent cache".into()).into());
    }
    json_result(&CacheClearOutput { cleared: true })
}
