//! MCP Server Implementation
//!
//! Line-oriented JSON-RPC loop: one request is read, dispatched and answered
//! before the next line is looked at.

use crate::mcp::errors::McpError;
use crate::mcp::protocol::*;
use crate::mcp::registry::ToolRegistry;
use anyhow::{Context, Result};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

/// The RPC methods this server understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ListTools,
    CallTool,
    Unknown(String),
}

impl Method {
    #[inline]
    pub fn parse(name: &str) -> Self {
        match name {
            "initialize" => Self::Initialize,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// MCP server state and configuration
pub struct McpServer {
    /// Server implementation information
    pub server_info: Implementation,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    registry: ToolRegistry,
}

impl McpServer {
    /// Create a new MCP server around a fully built registry
    #[inline]
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            registry,
        }
    }

    /// Start the server using stdio transport
    #[inline]
    pub async fn serve_stdio(&self) -> Result<()> {
        info!("Starting MCP server with stdio transport");

        let reader = BufReader::new(io::stdin());
        let mut writer = io::stdout();
        self.serve(reader, &mut writer).await
    }

    /// Serve requests from `reader` until end of input, answering on `writer`.
    ///
    /// Only a failed write ends the loop early: with the response stream gone
    /// there is nobody left to answer.
    #[inline]
    pub async fn serve<R, W>(&self, mut reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer).await {
                Ok(0) => {
                    info!("EOF reached, closing connection");
                    break;
                }
                Ok(_) => {
                    let Ok(line) = std::str::from_utf8(&buffer) else {
                        warn!("Invalid JSON: input line is not valid UTF-8");
                        continue;
                    };

                    if let Some(message) = self.handle_line(line).await {
                        send_message(writer, &message).await?;
                    }
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        info!("MCP server stopped");
        Ok(())
    }

    /// Handle one input line. `None` means nothing is sent back: the line was
    /// blank or could not be decoded into a JSON object.
    #[inline]
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcMessage> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        // Without a decoded object there is no id to address a reply to
        let message = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(message)) => message,
            Ok(_) => {
                warn!("Invalid JSON: expected an object");
                return None;
            }
            Err(e) => {
                warn!("Invalid JSON: {}", e);
                return None;
            }
        };

        Some(self.handle_message(&message).await)
    }

    /// Handle a decoded request object and build its reply
    #[inline]
    pub async fn handle_message(&self, message: &Map<String, Value>) -> JsonRpcMessage {
        let id = message.get("id").cloned().unwrap_or(Value::Null);

        let Some(method) = message.get("method").and_then(Value::as_str) else {
            return error_message(&McpError::InvalidRequest, id);
        };
        let params = match message.get("params") {
            Some(Value::Object(params)) => params.clone(),
            _ => Map::new(),
        };

        let method = Method::parse(method);
        debug!("Handling request {:?} (id {})", method, id);

        let outcome = AssertUnwindSafe(self.dispatch(method, &params))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(McpError::Internal {
                    message: panic_message(panic.as_ref()),
                })
            });

        match outcome {
            Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(result, id)),
            Err(e) => {
                if let McpError::Internal { message } = &e {
                    error!("Internal error while handling request {}: {}", id, message);
                }
                error_message(&e, id)
            }
        }
    }

    async fn dispatch(&self, method: Method, params: &Map<String, Value>) -> Result<Value, McpError> {
        match method {
            Method::Initialize => self.handle_initialize(params),
            Method::ListTools => self.handle_list_tools(),
            Method::CallTool => self.handle_call_tool(params).await,
            Method::Unknown(method) => Err(McpError::MethodNotFound { method }),
        }
    }

    /// Handle initialize request
    #[inline]
    pub fn handle_initialize(&self, params: &Map<String, Value>) -> Result<Value, McpError> {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(scalar_to_string)
            .unwrap_or_else(|| MCP_VERSION.to_string());

        let result = InitializeResult {
            protocol_version,
            capabilities: self.capabilities.clone(),
            server_info: self.server_info.clone(),
        };

        info!("Client initialized (protocol {})", result.protocol_version);
        to_value(&result)
    }

    /// Handle list tools request
    #[inline]
    pub fn handle_list_tools(&self) -> Result<Value, McpError> {
        let result = ListToolsResult {
            tools: self.registry.definitions(),
            next_cursor: None,
        };
        to_value(&result)
    }

    /// Handle call tool request
    #[inline]
    pub async fn handle_call_tool(&self, params: &Map<String, Value>) -> Result<Value, McpError> {
        let CallToolParams { name, arguments } = CallToolParams::from_params(params);

        let tool = self
            .registry
            .get(&name)
            .ok_or_else(|| McpError::ToolNotFound { name: name.clone() })?;

        info!("Calling tool: {}", name);
        let result = tool
            .call(arguments)
            .await
            .with_context(|| format!("Tool '{}' failed", name))?;

        if result.is_error() {
            debug!("Tool {} reported an error result", name);
        }
        to_value(&CallToolResult::from(result))
    }
}

/// Write one message as a single JSON line and flush it
async fn send_message<W>(writer: &mut W, message: &JsonRpcMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(message).context("Failed to encode response")?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await.context("Failed to write response")?;
    Ok(())
}

fn error_message(error: &McpError, id: Value) -> JsonRpcMessage {
    JsonRpcMessage::ErrorResponse(JsonRpcErrorResponse::new(error.to_jsonrpc_error(), id))
}

fn to_value<T: serde::Serialize>(result: &T) -> Result<Value, McpError> {
    serde_json::to_value(result).map_err(|e| McpError::Internal {
        message: e.to_string(),
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "request handler panicked".to_string()
    }
}
