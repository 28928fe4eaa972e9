//! Ailloy - versioned mold bundles from git
//!
//! CLI entry point that dispatches to subcommands.

use ailloy::cli::{Cli, Commands};
use ailloy::config::ConfigManager;
use ailloy::error::AilloyResult;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> AilloyResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("ailloy=warn"),
        1 => EnvFilter::new("ailloy=info"),
        _ => EnvFilter::new("ailloy=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    // Command line overrides the config file
    if let Some(dir) = cli.cache_dir {
        debug!("Cache root overridden: {}", dir.display());
        config.cache.root = Some(dir);
    }
    if let Some(file) = cli.lockfile {
        debug!("Lock file overridden: {}", file.display());
        config.lock.file = file;
    }

    // Dispatch to command
    match cli.command {
        Commands::Fetch(args) => ailloy::cli::commands::fetch(args, &config).await,
        Commands::Cache(args) => ailloy::cli::commands::cache(args, &config).await,
        Commands::Lock(args) => ailloy::cli::commands::lock(args, &config).await,
    }
}
