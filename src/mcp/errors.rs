//! MCP Error Handling
//!
//! Failures that end a request with a JSON-RPC error object instead of a
//! result. Tool-level problems (bad arguments, phpcs failures) are not errors
//! here: they travel back as successful results flagged with `isError`.

use crate::mcp::protocol::*;
use thiserror::Error;

/// Request-level errors raised while dispatching a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum McpError {
    #[error("Invalid Request")]
    InvalidRequest,

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl McpError {
    /// Convert MCP error to JSON-RPC error
    #[inline]
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Self::InvalidRequest => JsonRpcError::invalid_request(),
            Self::MethodNotFound { .. } => JsonRpcError::method_not_found(None),
            Self::ToolNotFound { name } => {
                JsonRpcError::method_not_found(Some(format!("Tool not found: {}", name)))
            }
            Self::Internal { message } => JsonRpcError::internal_error(message),
        }
    }
}

impl From<anyhow::Error> for McpError {
    #[inline]
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: format!("{:#}", err),
        }
    }
}
