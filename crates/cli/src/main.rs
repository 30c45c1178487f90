//! Claims Agent CLI
//!
//! Main entry point for the claims command-line tool.
//! Answers questions over claims tables and plan documents.

mod commands;

use clap::{Parser, Subcommand};
use claims_core::{config::AppConfig, logging, AppResult};
use commands::{AskCommand, IngestCommand, LoadCommand, StatusCommand};
use std::path::PathBuf;

/// Claims Agent CLI - questions over claims data and plan documents
#[derive(Parser, Debug)]
#[command(name = "claims")]
#[command(about = "Answer questions over claims data and plan documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CLAIMS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CLAIMS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion provider (anthropic, bedrock)
    #[arg(short, long, global = true, env = "CLAIMS_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "CLAIMS_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question about claims data or plan documents
    Ask(AskCommand),

    /// Load a CSV or Parquet file as a queryable table
    Load(LoadCommand),

    /// Ingest plan documents for search
    Ingest(IngestCommand),

    /// Show loaded tables, documents and provider
    Status(StatusCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Ask(_) => "ask",
            Self::Load(_) => "load",
            Self::Ingest(_) => "ingest",
            Self::Status(_) => "status",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Claims CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Data dir: {:?}", config.data_dir());
    tracing::debug!("Provider: {} ({})", config.provider, config.model);

    config.ensure_claims_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Load(cmd) => cmd.execute(&config),
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
