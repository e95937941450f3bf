//! MCP Tools Implementation
//!
//! The tool contract, the result type every tool produces, and the two
//! PHP_CodeSniffer tools built on top of the process runner.


pub mod check;
pub mod fix;
pub mod report;

pub use check::PhpcsCheckTool;
pub use fix::PhpcbfFixTool;

use crate::config::Config;
use crate::mcp::protocol::{CallToolResult, Tool, ToolContent, scalar_to_string};
use crate::process::CommandRunner;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Text returned when a tool is called without a usable `path`
pub const MISSING_PATH_MESSAGE: &str = "Missing required argument: path";

/// A named, schema-described unit of work invocable through `tools/call`
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema describing the accepted arguments
    fn input_schema(&self) -> Value;

    /// Run the tool. Problems the caller can act on come back as an error
    /// `ToolResult`; `Err` is reserved for failures of the server itself.
    async fn call(&self, arguments: Map<String, Value>) -> Result<ToolResult>;

    /// Descriptor published by `tools/list`
    #[inline]
    fn definition(&self) -> Tool {
        Tool {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Outcome of one tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    text: String,
    is_error: bool,
}

impl ToolResult {
    #[inline]
    pub fn new(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            text: text.into(),
            is_error,
        }
    }

    #[inline]
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.is_error
    }
}

impl From<ToolResult> for CallToolResult {
    #[inline]
    fn from(result: ToolResult) -> Self {
        Self {
            content: vec![ToolContent::Text { text: result.text }],
            is_error: result.is_error,
        }
    }
}

/// Collaborators shared by the tools
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub runner: Arc<dyn CommandRunner>,
    /// Base for relative paths and the directory phpcs/phpcbf run in
    pub working_dir: PathBuf,
}

impl ToolContext {
    #[inline]
    pub fn new(config: Config, runner: Arc<dyn CommandRunner>, working_dir: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            working_dir,
        }
    }

    /// The `--standard=` flag, when a ruleset is configured
    #[inline]
    pub fn standard_arg(&self) -> Option<String> {
        self.config
            .ruleset_path()
            .map(|ruleset| format!("--standard={}", ruleset.display()))
    }
}

/// The tools this server ships, in the order `tools/list` reports them
#[inline]
pub fn default_tools(context: &ToolContext) -> Vec<Box<dyn ToolHandler>> {
    vec![
        Box::new(PhpcsCheckTool::new(context.clone())),
        Box::new(PhpcbfFixTool::new(context.clone())),
    ]
}

/// Schema shared by both tools: a single required `path` string
pub(crate) fn path_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": description
            }
        },
        "required": ["path"]
    })
}

/// The `path` argument, if present and non-empty
#[inline]
pub fn required_path(arguments: &Map<String, Value>) -> Option<String> {
    arguments
        .get("path")
        .and_then(scalar_to_string)
        .filter(|path| !path.is_empty())
}

/// Resolve `path` against `working_dir` and canonicalize it, falling back to
/// the literal input when the filesystem cannot resolve it.
#[inline]
pub fn normalize_path(path: &str, working_dir: &Path) -> PathBuf {
    let candidate = Path::new(path);
    let full = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        working_dir.join(candidate)
    };

    full.canonicalize().unwrap_or_else(|_| PathBuf::from(path))
}
