//! Protein Profiler - Food product data cleaner & protein statistics explorer
//!
//! Rebuilds a small clean products relation from the raw Open Food Facts
//! dump and answers protein statistics queries through an interactive menu.

mod config;
mod data;
mod menu;
mod stats;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::AnalyzerConfig;
use data::{ProductCleaner, ProductStore};
use stats::QueryEngine;

#[derive(Parser)]
#[command(name = "protein_profiler", about, version)]
struct Cli {
    /// Path of the products relation.
    #[arg(long, default_value = "food.parquet")]
    store: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the products relation from a raw Open Food Facts TSV dump.
    Build {
        #[arg(default_value = "en.openfoodfacts.org.products.tsv")]
        input: PathBuf,
    },
    /// Interactive query menu (the default).
    Menu,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();
}

fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();
    let store = ProductStore::new(cli.store);

    match cli.command.unwrap_or(Command::Menu) {
        Command::Build { input } => {
            let config = AnalyzerConfig::new(input);
            let rows = ProductCleaner::run(&config, &store)?;
            println!("Done! Products relation rebuilt with {} rows.", rows);
        }
        Command::Menu => menu::run(&QueryEngine::new(store))?,
    }

    Ok(())
}
