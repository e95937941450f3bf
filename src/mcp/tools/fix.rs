use super::{MISSING_PATH_MESSAGE, ToolContext, ToolHandler, ToolResult};
use crate::process::CommandLine;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

pub const FIX_TOOL_NAME: &str = "phpcbf_fix";

/// Runs phpcbf and returns whatever it printed
pub struct PhpcbfFixTool {
    context: ToolContext,
}

impl PhpcbfFixTool {
    #[inline]
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    #[inline]
    pub fn command_line(&self, path: &str) -> CommandLine {
        CommandLine::new(self.context.config.phpcbf_path())
            .args(self.context.standard_arg())
            .arg(path)
            .current_dir(&self.context.working_dir)
    }
}

#[async_trait]
impl ToolHandler for PhpcbfFixTool {
    #[inline]
    fn name(&self) -> &str {
        FIX_TOOL_NAME
    }

    #[inline]
    fn description(&self) -> &str {
        "Run PHP_CodeSniffer fixer (phpcbf) for a file or directory and return the summary."
    }

    #[inline]
    fn input_schema(&self) -> Value {
        super::path_schema("Absolute or project-relative file/directory to fix")
    }

    #[inline]
    async fn call(&self, arguments: Map<String, Value>) -> Result<ToolResult> {
        let Some(path) = super::required_path(&arguments) else {
            return Ok(ToolResult::error(MISSING_PATH_MESSAGE));
        };
        let path = super::normalize_path(&path, &self.context.working_dir);
        debug!("Fixing {}", path.display());

        let command = self.command_line(&path.to_string_lossy());
        let output = self
            .context
            .runner
            .run(&command)
            .await
            .with_context(|| format!("Failed to run {}", command.display()))?;

        let combined = format!("{}\n{}", output.stdout, output.stderr);
        let text = combined.trim();
        let text = if text.is_empty() {
            format!("phpcbf finished with exit code {}", output.exit_code)
        } else {
            text.to_string()
        };

        Ok(ToolResult::new(text, !output.success()))
    }
}
