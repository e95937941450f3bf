//! MCP Protocol Implementation Tests
//!
//! Unit tests for the registry and the message dispatcher, using stub tools
//! so that no external binary is involved.

use crate::mcp::protocol::error_codes;
use crate::mcp::{JsonRpcMessage, McpServer, Method, ToolHandler, ToolRegistry, ToolResult};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value, json};

struct EchoTool {
    name: &'static str,
    description: &'static str,
}

#[async_trait]
impl ToolHandler for EchoTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"path": {"type": "string"}},
            "required": ["path"]
        })
    }

    async fn call(&self, arguments: Map<String, Value>) -> Result<ToolResult> {
        let flagged = arguments.get("flag").and_then(Value::as_bool).unwrap_or(false);
        Ok(ToolResult::new(Value::Object(arguments).to_string(), flagged))
    }
}

struct FailingTool;

#[async_trait]
impl ToolHandler for FailingTool {
    fn name(&self) -> &str {
        "failing"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: Map<String, Value>) -> Result<ToolResult> {
        Err(anyhow!("Failed to start process 'phpcs'"))
    }
}

struct PanickingTool;

#[async_trait]
impl ToolHandler for PanickingTool {
    fn name(&self) -> &str {
        "panicking"
    }

    fn description(&self) -> &str {
        "Always panics"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, _arguments: Map<String, Value>) -> Result<ToolResult> {
        panic!("tool blew up");
    }
}

fn echo(name: &'static str, description: &'static str) -> Box<dyn ToolHandler> {
    Box::new(EchoTool { name, description })
}

fn test_server() -> McpServer {
    let tools: Vec<Box<dyn ToolHandler>> = vec![
        echo("echo", "Echo arguments"),
        Box::new(FailingTool),
        Box::new(PanickingTool),
    ];
    McpServer::new(ToolRegistry::new(tools))
}

async fn reply(server: &McpServer, line: &str) -> Value {
    let message = server
        .handle_line(line)
        .await
        .expect("request should produce a reply");
    serde_json::to_value(message).expect("reply serializes")
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn preserves_registration_order() {
        let registry = ToolRegistry::new(vec![
            echo("b_tool", "B"),
            echo("a_tool", "A"),
            echo("c_tool", "C"),
        ]);

        assert_eq!(registry.names(), vec!["b_tool", "a_tool", "c_tool"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn duplicate_names_keep_position_of_first_and_value_of_last() {
        let registry = ToolRegistry::new(vec![
            echo("dup", "first"),
            echo("other", "other"),
            echo("dup", "second"),
        ]);

        assert_eq!(registry.names(), vec!["dup", "other"]);
        let dup = registry.get("dup").expect("dup is registered");
        assert_eq!(dup.description(), "second");
    }

    #[test]
    fn unknown_names_are_absent() {
        let registry = ToolRegistry::new(vec![echo("echo", "Echo")]);
        assert!(registry.get("missing").is_none());
        assert!(registry.get("").is_none());
    }

    #[test]
    fn empty_registry() {
        let registry = ToolRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.definitions().is_empty());
    }
}

#[cfg(test)]
mod method_tests {
    use super::*;

    #[test]
    fn parses_supported_methods() {
        assert_eq!(Method::parse("initialize"), Method::Initialize);
        assert_eq!(Method::parse("tools/list"), Method::ListTools);
        assert_eq!(Method::parse("tools/call"), Method::CallTool);
        assert_eq!(
            Method::parse("resources/list"),
            Method::Unknown("resources/list".to_string())
        );
        assert_eq!(
            Method::parse("Initialize"),
            Method::Unknown("Initialize".to_string())
        );
    }
}

#[cfg(test)]
mod initialize_tests {
    use super::*;

    #[tokio::test]
    async fn echoes_protocol_version() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18"}}"#,
        )
        .await;

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
        assert_eq!(response["result"]["serverInfo"]["name"], "mcp-phpcs-server");
        assert_eq!(
            response["result"]["serverInfo"]["version"],
            env!("CARGO_PKG_VERSION")
        );
        assert_eq!(
            response["result"]["capabilities"],
            json!({"tools": {"listChanged": false}})
        );
    }

    #[tokio::test]
    async fn other_versions_are_echoed_verbatim() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":"a","method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
        )
        .await;

        assert_eq!(response["id"], "a");
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn defaults_protocol_version() {
        let server = test_server();
        for line in [
            r#"{"id":1,"method":"initialize"}"#,
            r#"{"id":1,"method":"initialize","params":{}}"#,
            r#"{"id":1,"method":"initialize","params":[1,2]}"#,
            r#"{"id":1,"method":"initialize","params":{"protocolVersion":null}}"#,
        ] {
            let response = reply(&server, line).await;
            assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
        }
    }
}

#[cfg(test)]
mod list_tools_tests {
    use super::*;

    #[tokio::test]
    async fn lists_every_tool_with_schema() {
        let server = test_server();
        let response = reply(&server, r#"{"id":2,"method":"tools/list"}"#).await;

        let tools = response["result"]["tools"]
            .as_array()
            .expect("tools is an array");
        assert_eq!(tools.len(), 3);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["description"], "Echo arguments");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["path"]));
        assert_eq!(tools[1]["name"], "failing");
        assert_eq!(tools[2]["name"], "panicking");

        let result = response["result"].as_object().expect("result is an object");
        assert!(result.contains_key("nextCursor"));
        assert!(result["nextCursor"].is_null());
    }

    #[tokio::test]
    async fn repeated_listing_is_identical() {
        let server = test_server();
        let first = server
            .handle_line(r#"{"id":1,"method":"tools/list"}"#)
            .await
            .expect("reply");
        let second = server
            .handle_line(r#"{"id":1,"method":"tools/list"}"#)
            .await
            .expect("reply");

        assert_eq!(
            serde_json::to_string(&first).expect("serializes"),
            serde_json::to_string(&second).expect("serializes")
        );
    }

    #[tokio::test]
    async fn collapses_duplicate_names() {
        let server = McpServer::new(ToolRegistry::new(vec![
            echo("echo", "one"),
            echo("echo", "two"),
        ]));
        let response = reply(&server, r#"{"id":1,"method":"tools/list"}"#).await;

        let tools = response["result"]["tools"]
            .as_array()
            .expect("tools is an array");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["description"], "two");
    }
}

#[cfg(test)]
mod call_tool_tests {
    use super::*;

    #[tokio::test]
    async fn wraps_tool_result() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":3,"method":"tools/call","params":{"name":"echo","arguments":{"path":"src/a.php"}}}"#,
        )
        .await;

        assert_eq!(response["id"], 3);
        assert_eq!(response["result"]["isError"], false);
        assert_eq!(
            response["result"]["content"],
            json!([{"type": "text", "text": r#"{"path":"src/a.php"}"#}])
        );
    }

    #[tokio::test]
    async fn tool_error_is_a_successful_reply() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":4,"method":"tools/call","params":{"name":"echo","arguments":{"flag":true}}}"#,
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
    }

    #[tokio::test]
    async fn non_object_arguments_become_empty() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":5,"method":"tools/call","params":{"name":"echo","arguments":"path"}}"#,
        )
        .await;

        assert_eq!(response["result"]["content"][0]["text"], "{}");
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":6,"method":"tools/call","params":{"name":"phpstan_check","arguments":{}}}"#,
        )
        .await;

        assert_eq!(response["id"], 6);
        assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);
        let message = response["error"]["message"]
            .as_str()
            .expect("message is a string");
        assert!(message.contains("phpstan_check"));
        assert!(response.get("result").is_none());
    }

    #[tokio::test]
    async fn missing_tool_name_is_method_not_found() {
        let server = test_server();
        let response = reply(&server, r#"{"id":7,"method":"tools/call"}"#).await;

        assert_eq!(response["error"]["code"], error_codes::METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Tool not found: ");
    }

    #[tokio::test]
    async fn failing_tool_is_internal_error() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":8,"method":"tools/call","params":{"name":"failing"}}"#,
        )
        .await;

        assert_eq!(response["id"], 8);
        assert_eq!(response["error"]["code"], error_codes::INTERNAL_ERROR);
        assert_eq!(response["error"]["message"], "Internal error");
        let detail = response["error"]["data"]["message"]
            .as_str()
            .expect("data.message is a string");
        assert!(detail.contains("Failed to start process 'phpcs'"));
    }

    #[tokio::test]
    async fn panicking_tool_is_internal_error() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"id":9,"method":"tools/call","params":{"name":"panicking"}}"#,
        )
        .await;

        assert_eq!(response["error"]["code"], error_codes::INTERNAL_ERROR);
        assert_eq!(response["error"]["data"]["message"], "tool blew up");

        // The server keeps answering afterwards
        let response = reply(&server, r#"{"id":10,"method":"tools/list"}"#).await;
        assert_eq!(response["id"], 10);
        assert!(response["result"]["tools"].is_array());
    }
}

#[cfg(test)]
mod envelope_tests {
    use super::*;

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let server = test_server();
        let response = reply(&server, r#"{"id":3,"method":"nonexistent"}"#).await;

        assert_eq!(response["id"], 3);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found");
        assert_eq!(response["error"]["data"], json!({}));
    }

    #[tokio::test]
    async fn missing_or_non_string_method_is_invalid_request() {
        let server = test_server();
        for (line, id) in [
            (r#"{"id":11}"#, json!(11)),
            (r#"{"id":"x","method":42}"#, json!("x")),
            (r#"{"method":null}"#, Value::Null),
        ] {
            let response = reply(&server, line).await;
            assert_eq!(response["id"], id);
            assert_eq!(response["error"]["code"], error_codes::INVALID_REQUEST);
            assert_eq!(response["error"]["message"], "Invalid Request");
        }
    }

    #[tokio::test]
    async fn notifications_still_get_a_reply() {
        let server = test_server();
        let response = reply(
            &server,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;

        let envelope = response.as_object().expect("reply is an object");
        assert!(envelope.contains_key("id"));
        assert!(envelope["id"].is_null());
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn undecodable_lines_get_no_reply() {
        let server = test_server();
        for line in [
            "",
            "   \t",
            "not json",
            r#"{"id":1,"method":"initialize""#,
            "[1,2,3]",
            "\"initialize\"",
            "42",
            "null",
        ] {
            assert!(server.handle_line(line).await.is_none(), "line {:?}", line);
        }
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_ignored() {
        let server = test_server();
        let message = server
            .handle_line("  {\"id\":1,\"method\":\"tools/list\"}\r\n")
            .await
            .expect("reply");

        assert!(matches!(message, JsonRpcMessage::Response(_)));
        assert_eq!(message.id(), &json!(1));
    }
}

#[cfg(test)]
mod serve_tests {
    use super::*;

    async fn run(input: &[u8]) -> Vec<Value> {
        let server = test_server();
        let mut output = Vec::new();
        server
            .serve(input, &mut output)
            .await
            .expect("serve completes");

        String::from_utf8(output)
            .expect("output is utf-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is JSON"))
            .collect()
    }

    #[tokio::test]
    async fn answers_each_request_in_order() {
        let input = concat!(
            "{\"id\":1,\"method\":\"initialize\",\"params\":{\"protocolVersion\":\"2025-06-18\"}}\n",
            "\n",
            "this is not json\n",
            "{\"id\":2,\"method\":\"tools/list\"}\n",
            "[\"batch\"]\n",
            "{\"id\":3,\"method\":\"nonexistent\"}"
        );

        let responses = run(input.as_bytes()).await;
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(responses[2]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn skips_non_utf8_lines() {
        let mut input = b"{\"id\":1,\"method\":\"tools/list\"}\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"{\"id\":2,\"method\":\"tools/list\"}\n");

        let responses = run(&input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1]["id"], 2);
    }

    #[tokio::test]
    async fn writes_compact_lines_without_escaped_slashes() {
        let server = test_server();
        let mut output = Vec::new();
        server
            .serve(
                &b"{\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"echo\",\"arguments\":{\"path\":\"src/Foo.php\"}}}\n"[..],
                &mut output,
            )
            .await
            .expect("serve completes");

        let text = String::from_utf8(output).expect("output is utf-8");
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.contains("src/Foo.php"));
        assert!(!text.contains("\\/"));
        assert!(text.starts_with("{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":"));
    }

    #[tokio::test]
    async fn empty_input_produces_no_output() {
        assert!(run(b"").await.is_empty());
    }
}
