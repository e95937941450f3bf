use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::Result;
use crate::config::{Config, get_config_dir};
use crate::mcp::tools::default_tools;
use crate::mcp::{McpServer, ToolContext, ToolRegistry};
use crate::process::ProcessRunner;

/// Start the MCP server on stdio. Stdout carries protocol messages only.
#[inline]
pub async fn serve_mcp(config_dir: Option<PathBuf>) -> Result<()> {
    let working_dir = std::env::current_dir()?;
    let config = load_config(config_dir, &working_dir)?;

    info!(
        "Using phpcs '{}' and phpcbf '{}'",
        config.phpcs_path(),
        config.phpcbf_path()
    );
    match (config.ruleset_path(), config.ruleset_source()) {
        (Some(ruleset), Some(source)) => {
            info!("Using ruleset {} ({})", ruleset.display(), source);
        }
        _ => info!("No ruleset configured, phpcs defaults apply"),
    }

    let context = ToolContext::new(config, Arc::new(ProcessRunner::new()), working_dir);
    let registry = ToolRegistry::new(default_tools(&context));
    debug!("Registered tools: {}", registry.names().join(", "));

    McpServer::new(registry).serve_stdio().await?;
    Ok(())
}

/// Print the resolved configuration to stderr
#[inline]
pub fn show_config(config_dir: Option<PathBuf>) -> Result<()> {
    let working_dir = std::env::current_dir()?;
    let config_dir = resolve_config_dir(config_dir)?;
    let config = Config::load(&config_dir, &working_dir);

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Executables:").bold().yellow());
    eprintln!("  phpcs:  {}", style(config.phpcs_path()).cyan());
    eprintln!("  phpcbf: {}", style(config.phpcbf_path()).cyan());

    eprintln!();
    eprintln!("{}", style("Coding Standard:").bold().yellow());
    match (config.ruleset_path(), config.ruleset_source()) {
        (Some(ruleset), Some(source)) => {
            eprintln!("  Ruleset: {}", style(ruleset.display()).cyan());
            eprintln!("  Source:  {}", source);
        }
        _ => eprintln!("  Ruleset: {}", style("none (phpcs defaults)").dim()),
    }

    let config_path = Config::config_file_path(&config_dir);
    eprintln!();
    if config_path.is_file() {
        eprintln!("Config file: {}", style(config_path.display()).dim());
    } else {
        eprintln!(
            "Config file: {} {}",
            style(config_path.display()).dim(),
            style("(not present)").yellow()
        );
    }
    eprintln!("Working directory: {}", style(working_dir.display()).dim());

    Ok(())
}

fn load_config(config_dir: Option<PathBuf>, working_dir: &Path) -> Result<Config> {
    let config_dir = resolve_config_dir(config_dir)?;
    debug!("Loading configuration from {}", config_dir.display());
    Ok(Config::load(&config_dir, working_dir))
}

fn resolve_config_dir(config_dir: Option<PathBuf>) -> Result<PathBuf> {
    match config_dir {
        Some(dir) => Ok(dir),
        None => Ok(get_config_dir()?),
    }
}
