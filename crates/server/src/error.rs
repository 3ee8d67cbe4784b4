//! Structured errors for the tiercache MCP server.
//!
//! The cache itself never fails a call; these cover bad tool input and
//! lookups the caller asked to be strict about.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors for the tiercache MCP server.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty value).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No live cache entry for the given query.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// The cache refused or failed a write.
    #[error("CACHE_ERROR: {0}")]
    CacheError(String),

    /// Tool output could not be serialized.
    #[error("SERIALIZE_FAILED: {0}")]
    SerializeFailed(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::CacheMiss(msg) => (-32001, msg.clone()),
            ToolError::CacheError(msg) => (-32002, msg.clone()),
            ToolError::SerializeFailed(msg) => (-32000, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
