//! CLI command implementations.

use crate::config::{BarrelConfig, CONFIG_FILE};
use barrel_core::extract_exports;
use barrel_watcher::{IndexReport, Indexer, WatchSession};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Loads the config and applies folders given on the command line.
///
/// Returns the config and the directory its relative paths resolve against.
pub fn load_config(
    explicit: Option<&Path>,
    folders: Vec<String>,
) -> Result<(BarrelConfig, PathBuf)> {
    let base = std::env::current_dir()?;
    let config = match explicit {
        Some(path) => BarrelConfig::load(path, true)?,
        None => BarrelConfig::load(&base.join(CONFIG_FILE), false)?,
    };
    Ok((config.with_folders(folders), base))
}

/// Write a default config.json.
pub fn init(path: &Path) -> Result<()> {
    let config_path = path.join(CONFIG_FILE);

    if config_path.exists() {
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    let config = BarrelConfig::default();
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("{} Created {}", "✓".green(), config_path.display());
    println!(
        "  Folders: {}",
        config.folders_to_watch.join(", ").cyan()
    );
    println!("  Run {} to generate barrel files", "barrel index".cyan());

    Ok(())
}

/// Regenerate every barrel under the configured folders once.
pub fn index(config: &BarrelConfig, base: &Path) -> Result<()> {
    println!("{}", "Indexing folders...".cyan());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let mut indexer = Indexer::new(config.index_options(base));
    let mut total = IndexReport::default();
    let mut missing = Vec::new();

    for root in config.roots(base) {
        if !root.is_dir() {
            missing.push(root);
            continue;
        }
        spinner.set_message(format!("Indexing {}", root.display()));
        total.merge(indexer.reindex(&root));
    }

    spinner.finish_and_clear();
    indexer.log_mut().flush();

    println!(
        "{} Wrote {} barrels from {} files ({} exports) in {}ms",
        "✓".green(),
        total.barrels_written.to_string().cyan(),
        total.files_indexed.to_string().cyan(),
        total.exports_found.to_string().cyan(),
        start.elapsed().as_millis()
    );

    for root in &missing {
        eprintln!("{} Folder not found: {}", "⚠".yellow(), root.display());
    }

    print_errors(&total);
    Ok(())
}

/// Index once, then keep barrels in sync until Ctrl+C.
pub async fn watch(config: &BarrelConfig, base: &Path) -> Result<()> {
    let roots = config.roots(base);
    let mut indexer = Indexer::new(config.index_options(base));

    let mut total = IndexReport::default();
    for root in &roots {
        total.merge(indexer.reindex(root));
    }
    print_errors(&total);

    let mut session = WatchSession::new(indexer)?;
    let watching = roots.iter().filter(|root| session.watch(root)).count();
    if watching == 0 {
        return Err("none of the configured folders exist".into());
    }

    println!(
        "{} Watching {} of {} folders",
        "✓".green(),
        watching.to_string().cyan(),
        roots.len()
    );
    println!("  Press {} to stop", "Ctrl+C".cyan());

    // The session owns the indexer and runs on its own thread; events are
    // handled one at a time there.
    let shutdown = session.shutdown_handle();
    let handle = tokio::task::spawn_blocking(move || session.run());

    tokio::signal::ctrl_c().await?;
    shutdown.shutdown();
    handle.await?;

    println!("{} Stopped watching", "✓".green());
    Ok(())
}

/// Print the exports found in one file.
pub fn exports(file: &Path, json_output: bool) -> Result<()> {
    let records = extract_exports(file)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No exports found in {}", file.display());
        return Ok(());
    }

    println!("Found {} exports in {}:\n", records.len(), file.display());
    for record in &records {
        println!(
            "  {} {}",
            format!("{:<7}", record.kind.to_string()).yellow(),
            record.name.cyan()
        );
    }

    Ok(())
}

fn print_errors(report: &IndexReport) {
    if report.errors.is_empty() {
        return;
    }

    println!("\n{} files or folders could not be processed:", "⚠".yellow());
    for (path, error) in report.errors.iter().take(5) {
        println!("  {} - {}", path.display().to_string().red(), error);
    }
    if report.errors.len() > 5 {
        println!("  ... and {} more", report.errors.len() - 5);
    }
}
