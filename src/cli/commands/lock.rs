//! Lock command - inspect and edit the lock file

use crate::cli::args::{LockAction, LockArgs, OutputFormat};
use crate::config::Config;
use crate::error::{AilloyError, AilloyResult};
use crate::mold::{LockEntry, LockFile, Reference};
use console::style;
use std::path::Path;

/// Execute the lock command
pub async fn execute(args: LockArgs, config: &Config) -> AilloyResult<()> {
    let path = config.lock.file.as_path();

    match args.action {
        LockAction::List { format } => list_entries(path, format),
        LockAction::Remove { reference } => remove_entry(path, &reference).await,
    }
}

fn list_entries(path: &Path, format: OutputFormat) -> AilloyResult<()> {
    let entries = LockFile::read(path)?
        .map(|lock| lock.entries)
        .unwrap_or_default();

    if entries.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => println!("No lock file entries in {}", path.display()),
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}@{}", entry.source, entry.version);
            }
        }
    }
    Ok(())
}

fn print_table(entries: &[LockEntry]) {
    println!(
        "{:<20} {:<40} {:<12} {:<12} {:<20}",
        style("NAME").bold(),
        style("SOURCE").bold(),
        style("VERSION").bold(),
        style("COMMIT").bold(),
        style("LOCKED").bold()
    );
    println!("{}", "-".repeat(104));

    for entry in entries {
        let commit: String = entry.commit.chars().take(10).collect();
        println!(
            "{:<20} {:<40} {:<12} {:<12} {:<20}",
            entry.name,
            entry.source,
            entry.version,
            commit,
            entry.timestamp.format("%Y-%m-%d %H:%M")
        );
    }
}

async fn remove_entry(path: &Path, raw: &str) -> AilloyResult<()> {
    if !path.exists() {
        return Err(AilloyError::User(format!(
            "No lock file at {}",
            path.display()
        )));
    }

    // Accept a full reference as well as a bare host/owner/repo
    let source = Reference::parse(raw)?.cache_key();
    let owned_path = path.to_path_buf();
    let key = source.clone();
    let removed = tokio::task::spawn_blocking(move || {
        LockFile::update(&owned_path, |lock| lock.remove_entry(&key))
    })
    .await
    .map_err(|e| AilloyError::Internal(format!("lock update task failed: {}", e)))??;

    match removed {
        Some(entry) => println!(
            "{} unpinned {} (was {})",
            style("✓").green(),
            source,
            entry.version
        ),
        None => println!("{} is not in {}", source, path.display()),
    }
    Ok(())
}
