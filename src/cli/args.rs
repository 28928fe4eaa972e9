//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Ailloy - versioned mold bundles from git
///
/// Resolves mold references against their origin repositories, caches the
/// snapshots, and pins them in a lock file.
#[derive(Parser, Debug)]
#[command(name = "ailloy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "AILLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mold cache directory (default: ~/.ailloy/cache)
    #[arg(long, global = true, env = "AILLOY_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Lock file path (default: ./ailloy.lock)
    #[arg(long, global = true)]
    pub lockfile: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a mold reference and cache it
    Fetch(FetchArgs),

    /// Inspect or clean the mold cache
    Cache(CacheArgs),

    /// Inspect or edit the lock file
    Lock(LockArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Mold reference, e.g. github.com/acme/widget@^1.0.0//molds/claude
    pub reference: String,

    /// Neither read nor update the lock file
    #[arg(long)]
    pub no_lock: bool,
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached molds and their versions
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove cached molds
    #[command(group(clap::ArgGroup::new("target").required(true).args(["reference", "all"])))]
    Clean {
        /// Remove only this mold's repository cache
        reference: Option<String>,

        /// Remove everything in the cache
        #[arg(long)]
        all: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the lock command
#[derive(Parser, Debug)]
pub struct LockArgs {
    /// Subcommand for lock
    #[command(subcommand)]
    pub action: LockAction,
}

/// Lock subcommands
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Show pinned molds
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Unpin a mold so the next fetch resolves it again
    Remove {
        /// Mold reference or host/owner/repo
        reference: String,
    },
}
