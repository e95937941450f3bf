use clap::{Parser, Subcommand};
use phpcs_mcp::Result;
use phpcs_mcp::commands::{serve_mcp, show_config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phpcs-mcp")]
#[command(about = "MCP server exposing PHP_CodeSniffer (phpcs/phpcbf) as tools over stdio")]
#[command(version)]
struct Cli {
    /// Directory holding config.json (defaults to ~/.phpcs-mcp)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio (the default)
    Serve,
    /// Show the resolved phpcs/phpcbf configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Stdout belongs to the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            serve_mcp(cli.config_dir).await?;
        }
        Commands::Config => {
            show_config(cli.config_dir)?;
        }
    }

    Ok(())
}
