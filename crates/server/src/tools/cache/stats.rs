//! cache_stats tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use tiercache_core::CacheFacade;

use super::json_result;

/// Implementation of the cache_stats tool.
pub async fn stats_impl(cache: &CacheFacade) -> Result<CallToolResult, McpError> {
    json_result(&cache.stats().await)
}
