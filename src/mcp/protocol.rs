//! MCP Protocol Types and Messages
//!
//! This module defines the JSON-RPC 2.0 envelopes and the subset of Model
//! Context Protocol payloads this server speaks: `initialize`, `tools/list`
//! and `tools/call`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// MCP protocol version announced when the client does not name one
pub const MCP_VERSION: &str = "2025-06-18";

/// JSON-RPC 2.0 version identifier
pub const JSONRPC_VERSION: &str = "2.0";

/// Server name reported in `serverInfo`
pub const SERVER_NAME: &str = "mcp-phpcs-server";

/// Server version reported in `serverInfo`
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC 2.0 Response message (success)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    pub result: Value,
}

/// JSON-RPC 2.0 Error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    pub data: Value,
}

/// JSON-RPC 2.0 Error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: String,
    pub id: Value,
    pub error: JsonRpcError,
}

/// Any message this server writes to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Response(JsonRpcResponse),
    ErrorResponse(JsonRpcErrorResponse),
}

/// MCP Initialize Response result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
}

/// Server capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

/// Tools capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Implementation information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// List tools response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,
    /// Always `null`: the whole list fits in one page
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Tool call request parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl CallToolParams {
    /// Read `name` and `arguments` leniently: a missing or oddly typed name becomes
    /// empty, and anything but an object for `arguments` becomes an empty map.
    #[inline]
    pub fn from_params(params: &Map<String, Value>) -> Self {
        let name = params.get("name").and_then(scalar_to_string).unwrap_or_default();
        let arguments = match params.get("arguments") {
            Some(Value::Object(arguments)) => arguments.clone(),
            _ => Map::new(),
        };

        Self { name, arguments }
    }
}

/// Tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// Tool content types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl JsonRpcResponse {
    /// Create a new JSON-RPC response
    #[inline]
    pub fn new(result: Value, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
        }
    }
}

impl JsonRpcErrorResponse {
    /// Create a new JSON-RPC error response
    #[inline]
    pub fn new(error: JsonRpcError, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            error,
        }
    }
}

impl JsonRpcMessage {
    #[inline]
    pub fn id(&self) -> &Value {
        match self {
            Self::Response(response) => &response.id,
            Self::ErrorResponse(response) => &response.id,
        }
    }
}

impl JsonRpcError {
    /// Create a new JSON-RPC error; `data` of `None` is sent as an empty object
    #[inline]
    pub fn new(code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            code,
            message,
            data: data.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    /// Create an invalid request error
    #[inline]
    pub fn invalid_request() -> Self {
        Self::new(
            error_codes::INVALID_REQUEST,
            "Invalid Request".to_string(),
            None,
        )
    }

    /// Create a method not found error
    #[inline]
    pub fn method_not_found(message: Option<String>) -> Self {
        let msg = message.unwrap_or_else(|| "Method not found".to_string());
        Self::new(error_codes::METHOD_NOT_FOUND, msg, None)
    }

    /// Create an internal error carrying the failure text as `data.message`
    #[inline]
    pub fn internal_error(detail: &str) -> Self {
        Self::new(
            error_codes::INTERNAL_ERROR,
            "Internal error".to_string(),
            Some(serde_json::json!({ "message": detail })),
        )
    }
}

/// String form of a JSON scalar; `null`, arrays and objects have none
#[inline]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
