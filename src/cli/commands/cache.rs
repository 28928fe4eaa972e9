//! Cache command - inspect and clean the mold cache

use crate::cache::{CacheLayout, CachedMold};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::AilloyResult;
use crate::mold::Reference;
use console::style;
use std::io::{self, Write};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> AilloyResult<()> {
    let layout = CacheLayout::new(config.cache.root()?);

    match args.action {
        CacheAction::List { format } => list_molds(&layout, format),
        CacheAction::Clean {
            reference: Some(raw),
            ..
        } => clean_mold(&layout, &raw),
        CacheAction::Clean { yes, .. } => clean_all(&layout, yes),
    }
}

/// List cached molds
fn list_molds(layout: &CacheLayout, format: OutputFormat) -> AilloyResult<()> {
    let molds = layout.list()?;

    if molds.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("No cached molds in {}", layout.root().display()),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&molds),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&molds)?),
        OutputFormat::Plain => {
            for mold in &molds {
                println!("{}", mold.cache_key());
            }
        }
    }

    Ok(())
}

fn print_table(molds: &[CachedMold]) {
    println!(
        "{:<50} {}",
        style("MOLD").bold(),
        style("VERSIONS").bold()
    );
    println!("{}", "-".repeat(70));

    for mold in molds {
        let versions = if mold.versions.is_empty() {
            style("(clone only)").dim().to_string()
        } else {
            mold.versions.join(", ")
        };
        println!("{:<50} {}", mold.cache_key(), versions);
    }

    println!();
    println!("Total: {} mold(s)", molds.len());
}

/// Remove one repository's cache
fn clean_mold(layout: &CacheLayout, raw: &str) -> AilloyResult<()> {
    let reference = Reference::parse(raw)?;
    if layout.clean(&reference)? {
        println!(
            "{} removed {}",
            style("✓").green(),
            reference.cache_key()
        );
    } else {
        println!("{} is not cached", reference.cache_key());
    }
    Ok(())
}

/// Remove everything under the cache root
fn clean_all(layout: &CacheLayout, skip_confirm: bool) -> AilloyResult<()> {
    let molds = layout.list()?;
    if molds.is_empty() {
        println!("Cache is already empty.");
        return Ok(());
    }

    println!("This will remove {} cached mold(s):", molds.len());
    for mold in &molds {
        println!("  {} {}", style("•").red(), mold.cache_key());
    }
    println!();

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = layout.clean_all()?;
    println!("{} cleared {} cache entr(ies)", style("✓").green(), removed);

    Ok(())
}
