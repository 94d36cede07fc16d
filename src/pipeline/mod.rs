//! Offline enrichment pipeline: the batch scraping driver plus the merge
//! step that folds intermediate results back onto the source table.

pub mod driver;
pub mod manifest;
pub mod merge;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use std::path::{Path, PathBuf};

use crate::resolver::Resolver;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_WORKERS: usize = 4;

/// Runtime knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub workers: usize,
    pub batch_size: usize,
    /// Explicit starting batch; `None` resumes from the job manifest.
    pub start_batch: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
            start_batch: None,
        }
    }
}

/// Scrape all batches of `source`, then merge: the whole
/// `<source> → <source stem>_output.csv` flow. Returns the output path.
pub async fn run(source: &Path, options: &PipelineOptions) -> Result<PathBuf> {
    let resolver = Resolver::new()?;
    let effective_batch_size = driver::run(&resolver, source, options).await?;
    merge::run(source, effective_batch_size)
}

/// Working directory for intermediates: the source path minus its extension.
pub fn workdir_for(source: &Path) -> PathBuf {
    source.with_extension("")
}

/// Read a CSV table into (headers, rows).
pub fn read_table(path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader
        .headers()
        .context("failed to read CSV headers")?
        .clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record.context("malformed CSV row")?);
    }
    Ok((headers, rows))
}

/// Position of a named column, error if absent.
pub fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("source table has no '{name}' column"))
}
