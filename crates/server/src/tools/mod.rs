//! MCP tool implementations.
//!
//! This module contains all tools exposed by the tiercache server.

pub mod cache;
