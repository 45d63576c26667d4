//! Gazetteer ingest pipeline.
//!
//! Reads a populated-place extract, disambiguates colliding names,
//! and writes the surviving places to a sled database or CSV files.

mod gnis;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gazetteer::config::Config;
use gazetteer::disambiguate::Disambiguator;
use gazetteer::export::Exporter;
use gazetteer::names::NameIndex;
use gazetteer::sink::{CsvSink, PlaceSink, SledSink};
use gazetteer::spatial::SpatialIndex;
use gazetteer::states::StateTable;

use crate::gnis::ExtractReader;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SinkKind {
    Sled,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Disambiguate a populated-place extract and load it into a name database")]
struct Args {
    /// Pipe-delimited extract to import (optionally .gz)
    #[arg(short, long)]
    file: PathBuf,

    /// TOML config file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV of state abbreviations and names, replaces the built-in table
    #[arg(long)]
    states: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "sled")]
    sink: SinkKind,

    /// Output location: sled database path or CSV directory
    #[arg(short, long, default_value = "places.db")]
    output: PathBuf,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Gazetteer Ingest Pipeline");
    info!("File: {}", args.file.display());

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let states = match &args.states {
        Some(path) => StateTable::load_from_file(path)?,
        None => StateTable::builtin()?,
    };

    // Read places
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} rows ({per_sec})")?,
    );
    let reader = ExtractReader::new()?;
    let (store, _stats) = reader.read_file(&args.file, &spinner)?;
    spinner.finish_and_clear();

    if store.is_empty() {
        anyhow::bail!("No populated places with coordinates in {}", args.file.display());
    }

    // Build indexes once over the final record set
    let names = NameIndex::build(&store);
    let spatial = SpatialIndex::build(&store);

    // Disambiguate
    let pb = ProgressBar::new(names.ambiguous_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );
    let result = Disambiguator::new(&store, &names, &spatial, &config.disambiguation)
        .with_progress(pb)
        .run();

    // Export
    let sink: Box<dyn PlaceSink> = match args.sink {
        SinkKind::Sled => Box::new(SledSink::open(&args.output)?),
        SinkKind::Csv => Box::new(CsvSink::create(&args.output)?),
    };
    let exporter = Exporter::new(&store, &result, &states, &config.export);
    let committed = exporter
        .write_to(sink)
        .context("Failed to write places")?;

    // Final stats
    info!(
        "Excluded {} of {} places; {} written to {}",
        result.summary.excluded,
        result.summary.total,
        committed,
        args.output.display()
    );

    Ok(())
}
