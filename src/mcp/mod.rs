//! MCP (Model Context Protocol) Server Implementation
//!
//! This module provides a stdio MCP server speaking line-delimited JSON-RPC
//! 2.0, exposing the PHP_CodeSniffer tools.

#[cfg(test)]
mod tests;

pub mod errors;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod tools;

pub use errors::McpError;
pub use protocol::{
    CallToolParams, CallToolResult, JsonRpcError, JsonRpcMessage, ListToolsResult, Tool,
    ToolContent,
};
pub use registry::ToolRegistry;
pub use server::{McpServer, Method};
pub use tools::{ToolContext, ToolHandler, ToolResult};
