use anyhow::Result;
use bookdex::pipeline::{self, PipelineOptions, DEFAULT_BATCH_SIZE, DEFAULT_WORKERS};
use bookdex::util::env::{env_parse, init_env};
use clap::Parser;
use std::path::PathBuf;

/// Scrape summaries and subject keywords for every identifier in a book
/// spreadsheet, then merge them back into `<name>_output.csv`.
#[derive(Parser, Debug)]
#[command(name = "bookdex", version, about)]
struct Cli {
    /// Source CSV with `Index` and `ISBN` columns
    source: PathBuf,

    /// First batch to process; earlier batches are skipped unconditionally.
    /// Without it, batches already recorded as complete are skipped.
    start_batch: Option<usize>,

    /// Concurrent resolver workers (falls back to ENRICH_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    /// Identifiers per batch (falls back to ENRICH_BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- logging -------------------------------------------------------------
    init_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let options = PipelineOptions {
        workers: cli
            .workers
            .unwrap_or_else(|| env_parse("ENRICH_WORKERS", DEFAULT_WORKERS)),
        batch_size: cli
            .batch_size
            .unwrap_or_else(|| env_parse("ENRICH_BATCH_SIZE", DEFAULT_BATCH_SIZE)),
        start_batch: cli.start_batch,
    };

    pipeline::run(&cli.source, &options).await?;
    Ok(())
}
