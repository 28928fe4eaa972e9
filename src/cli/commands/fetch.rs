//! Fetch command - resolve a mold reference into the cache

use crate::cache::CacheLayout;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::AilloyResult;
use crate::git::CommandGit;
use crate::mold::MoldResolver;
use console::style;
use std::sync::Arc;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> AilloyResult<()> {
    let layout = CacheLayout::new(config.cache.root()?);
    let git = Arc::new(CommandGit::new(&config.git.binary));

    let resolver = MoldResolver::new(layout, git);
    let resolver = if args.no_lock || !config.lock.enabled {
        resolver.without_lockfile()
    } else {
        resolver.with_lockfile(&config.lock.file)
    };

    let mold = resolver.resolve_detailed(&args.reference).await?;

    let pinned = if mold.locked {
        style("(locked)").dim().to_string()
    } else {
        String::new()
    };
    println!(
        "{} {} {} {} {}",
        style("✓").green(),
        mold.reference,
        style("→").dim(),
        style(&mold.version.tag).bold(),
        pinned
    );
    println!("  {}", mold.view.root().display());

    Ok(())
}
