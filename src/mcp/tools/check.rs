use super::report::format_output;
use super::{MISSING_PATH_MESSAGE, ToolContext, ToolHandler, ToolResult};
use crate::process::CommandLine;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

pub const CHECK_TOOL_NAME: &str = "phpcs_check";

/// Runs phpcs with the JSON report and turns it into a readable summary
pub struct PhpcsCheckTool {
    context: ToolContext,
}

impl PhpcsCheckTool {
    #[inline]
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    #[inline]
    pub fn command_line(&self, path: &str) -> CommandLine {
        CommandLine::new(self.context.config.phpcs_path())
            .arg("--report=json")
            .args(self.context.standard_arg())
            .arg(path)
            .current_dir(&self.context.working_dir)
    }
}

#[async_trait]
impl ToolHandler for PhpcsCheckTool {
    #[inline]
    fn name(&self) -> &str {
        CHECK_TOOL_NAME
    }

    #[inline]
    fn description(&self) -> &str {
        "Run PHP_CodeSniffer (phpcs) against a file or directory and return a readable report."
    }

    #[inline]
    fn input_schema(&self) -> Value {
        super::path_schema("Absolute or project-relative file/directory to check")
    }

    #[inline]
    async fn call(&self, arguments: Map<String, Value>) -> Result<ToolResult> {
        let Some(path) = super::required_path(&arguments) else {
            return Ok(ToolResult::error(MISSING_PATH_MESSAGE));
        };
        let path = super::normalize_path(&path, &self.context.working_dir);
        debug!("Checking {}", path.display());

        let command = self.command_line(&path.to_string_lossy());
        let output = self
            .context
            .runner
            .run(&command)
            .await
            .with_context(|| format!("Failed to run {}", command.display()))?;

        // phpcs exits non-zero whenever it finds violations, so only a silent failure is fatal
        if !output.success() && output.stdout.is_empty() {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                "phpcs failed".to_string()
            } else {
                format!("phpcs failed: {}", stderr)
            };
            return Ok(ToolResult::error(message));
        }

        let (text, has_findings) = format_output(&output.stdout);
        Ok(ToolResult::new(text, has_findings))
    }
}
