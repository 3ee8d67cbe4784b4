//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{
    CacheGetParams, CacheInvalidateParams, CachePurgeParams, CachePutParams, clear_impl, get_impl, invalidate_impl,
    purge_impl, put_impl, stats_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use tiercache_core::CacheFacade;

/// The main MCP server handler for tiercache.
#[derive(Clone)]
pub struct TierCacheServer {
    cache: Arc<CacheFacade>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl TierCacheServer {
    /// Create a new server handler over a shared cache.
    pub fn new(cache: Arc<CacheFacade>) -> Self {
        Self { cache, tool_router: Self::tool_router() }
    }

    #[tool(description = "Look up a cached value by query and namespace. Fails with CACHE_MISS when absent or expired.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.cache, params.0).await
    }

    #[tool(description = "Cache a non-empty value under a query and namespace, with an optional TTL in seconds.")]
    async fn cache_put(&self, params: Parameters<CachePutParams>) -> Result<CallToolResult, McpError> {
        put_impl(&self.cache, params.0).await
    }

    #[tool(description = "Remove a cached value from both tiers. Reports whether a stored entry existed.")]
    async fn cache_invalidate(&self, params: Parameters<CacheInvalidateParams>) -> Result<CallToolResult, McpError> {
        invalidate_impl(&self.cache, params.0).await
    }

    #[tool(description = "Remove every cached value.")]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        clear_impl(&self.cache).await
    }

    #[tool(description = "Report valid/expired counts, memory size and average access count.")]
    async fn cache_stats(&self) -> Result<CallToolResult, McpError> {
        stats_impl(&self.cache).await
    }

    #[tool(description = "Purge entries that have expired, belong to a namespace, or exceed a maximum entry count.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.cache, params.0).await
    }
}

impl ServerHandler for TierCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "tiercache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
