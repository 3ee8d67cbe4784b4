//! Cache-related MCP tools.
//!
//! Each tool is a thin adapter over one `CacheFacade` operation.

pub mod clear;
pub mod get;
pub mod invalidate;
pub mod purge;
pub mod put;
pub mod stats;

pub use clear::clear_impl;
pub use get::{CacheGetParams, get_impl};
pub use invalidate::{CacheInvalidateParams, invalidate_impl};
pub use purge::{CachePurgeParams, purge_impl};
pub use put::{CachePutParams, put_impl};
pub use stats::stats_impl;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

/// Namespace used when a tool call does not name one.
pub(crate) fn default_namespace() -> String {
    "default".into()
}

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::SerializeFailed(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
