//! Barrel CLI - Command-line interface for Barrel
//!
//! This is the main entry point for users. It reads `config.json`,
//! resolves the configured folders and either regenerates their barrel
//! files once or keeps them in sync while files change.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "barrel")]
#[command(author = "Barrel Contributors")]
#[command(version)]
#[command(about = "Keeps index re-export files in sync with your components", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./config.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config.json in the current directory
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Regenerate all barrel files once
    Index {
        /// Root folders (override foldersToWatch from the config)
        folders: Vec<String>,
    },

    /// Regenerate barrel files, then keep them in sync until Ctrl+C
    Watch {
        /// Root folders (override foldersToWatch from the config)
        folders: Vec<String>,
    },

    /// Show the exports detected in a file
    Exports {
        /// Component file to inspect
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Index { folders } => match commands::load_config(config_path, folders) {
            Ok((config, base)) => commands::index(&config, &base),
            Err(e) => Err(e),
        },
        Commands::Watch { folders } => match commands::load_config(config_path, folders) {
            Ok((config, base)) => commands::watch(&config, &base).await,
            Err(e) => Err(e),
        },
        Commands::Exports { file, json } => commands::exports(&file, json),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
