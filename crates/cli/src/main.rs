// ABOUTME: CLI for collecting vendor release notes into Airtable and/or a CSV file.
// ABOUTME: Wires environment config, fetcher, store and source selection into one pipeline run.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use relnotes_core::{
    AirtableStore, FetchOptions, Fetcher, FileFetcher, HttpFetcher, Pipeline, SourceRegistry,
    StoreConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Collect release notes and push them to Airtable/CSV.
#[derive(Parser, Debug)]
#[command(name = "relnotes")]
#[command(about = "Collect release notes and push to Airtable/CSV", long_about = None)]
struct Args {
    /// Comma-separated list of sources to fetch (default: all)
    #[arg(long, default_value = "")]
    sources: String,

    /// Optional CSV output path
    #[arg(long = "csv")]
    csv_path: Option<PathBuf>,

    /// Do not write records to Airtable (useful for local runs)
    #[arg(long)]
    skip_airtable: bool,

    /// Parse a saved page instead of fetching (requires exactly one source)
    #[arg(long)]
    html: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

fn load_store(skip: bool) -> Option<AirtableStore> {
    if skip {
        return None;
    }
    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            warn!("Airtable is not configured: {}. Skipping Airtable upload.", err);
            return None;
        }
    };
    match AirtableStore::new(&config) {
        Ok(store) => Some(store),
        Err(err) => {
            warn!("Airtable client could not be created: {}. Skipping Airtable upload.", err);
            None
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let registry = SourceRegistry::builtin();

    // Reject bad selections before touching the network.
    let selected = registry.resolve(&args.sources)?;
    if args.html.is_some() && selected.len() != 1 {
        bail!("--html requires exactly one source in --sources");
    }

    let fetcher: Box<dyn Fetcher> = match &args.html {
        Some(path) => Box::new(FileFetcher::new(path)),
        None => Box::new(HttpFetcher::new(FetchOptions::default())?),
    };
    let store = load_store(args.skip_airtable);

    let mut builder = Pipeline::builder(&registry, fetcher.as_ref());
    if let Some(store) = &store {
        builder = builder.store(store);
    }
    if let Some(path) = &args.csv_path {
        builder = builder.csv_path(path);
    }

    let summary = builder.build().run(&args.sources)?;
    info!(
        sources = %summary.sources.join(","),
        extracted = summary.extracted,
        new = summary.new_records,
        exported = summary.exported.unwrap_or(0),
        created = summary.created,
        failed = summary.failed,
        "run complete"
    );

    Ok(())
}
