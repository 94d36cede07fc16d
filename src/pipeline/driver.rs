//! Batch scraping driver: reads the identifier column, walks batches
//! sequentially, and fans each batch out to a bounded worker pool.

use anyhow::{ensure, Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::manifest::{JobStatus, Manifest};
use super::{column_index, read_table, workdir_for, PipelineOptions};
use crate::normalization::isbn::normalize;
use crate::resolver::Resolver;

/// One line of an intermediate batch file.
#[derive(Debug)]
struct ResolvedRow {
    row: usize,
    identifier: String,
    keywords: String,
    summary: String,
    norm_isbn: String,
    batch: usize,
}

/// Scrape every batch of `source` into `workdir/<batch>.csv`. Returns the
/// effective batch size (the manifest's on resume, which may differ from
/// the requested one).
pub async fn run(resolver: &Resolver, source: &Path, options: &PipelineOptions) -> Result<usize> {
    ensure!(options.batch_size > 0, "batch size must be at least 1");
    ensure!(options.workers > 0, "worker pool must be at least 1");

    let (headers, rows) = read_table(source)?;
    let isbn_col = column_index(&headers, "ISBN")?;
    let identifiers: Vec<String> = rows
        .iter()
        .map(|r| r.get(isbn_col).unwrap_or_default().trim().to_string())
        .collect();

    let workdir = workdir_for(source);
    fs::create_dir_all(&workdir)
        .with_context(|| format!("failed to create working dir {}", workdir.display()))?;

    let mut manifest = Manifest::load_or_build(&workdir, source, options.batch_size, &identifiers);
    let batch_size = manifest.batch_size;
    let n_batches = manifest.n_batches();
    let pool = Arc::new(Semaphore::new(options.workers));

    for batch in 0..n_batches {
        let skip = match options.start_batch {
            // Explicit offset: process from there on, nothing before it.
            Some(start) => batch < start,
            // Otherwise resume: redo only batches with pending jobs.
            None => manifest.batch_complete(batch),
        };
        if skip {
            tracing::debug!(batch, "skipping batch");
            continue;
        }

        println!("{}/{}", batch * batch_size, identifiers.len());

        let lo = batch * batch_size;
        let hi = ((batch + 1) * batch_size).min(identifiers.len());
        let results = resolve_batch(resolver, &identifiers[lo..hi], lo, batch, &pool).await;

        write_batch_file(&workdir, batch, &results)?;
        for resolved in &results {
            let status = if resolved.keywords.is_empty() && resolved.summary.is_empty() {
                JobStatus::Failed
            } else {
                JobStatus::Done
            };
            manifest.mark(resolved.row, status);
        }
        manifest.save(&workdir)?;
        tracing::info!(batch, rows = results.len(), "batch written");
    }

    println!("All data scraped");
    Ok(batch_size)
}

/// Resolve one batch on the shared pool, collecting in completion order.
/// Ordering does not matter downstream: each row carries its identifier
/// and batch tag.
async fn resolve_batch(
    resolver: &Resolver,
    identifiers: &[String],
    first_row: usize,
    batch: usize,
    pool: &Arc<Semaphore>,
) -> Vec<ResolvedRow> {
    let mut tasks = FuturesUnordered::new();
    for (offset, identifier) in identifiers.iter().enumerate() {
        let pool = Arc::clone(pool);
        tasks.push(async move {
            let _permit = pool.acquire().await.ok();
            let resolution = resolver.resolve(identifier).await;
            (first_row + offset, resolution)
        });
    }

    let mut out = Vec::with_capacity(identifiers.len());
    while let Some((row, resolution)) = tasks.next().await {
        if resolution.is_miss() {
            tracing::debug!(row, identifier = %resolution.identifier, "no source had anything");
        }
        let keywords = resolution.keywords_joined();
        let norm_isbn = normalize(&resolution.identifier);
        out.push(ResolvedRow {
            row,
            identifier: resolution.identifier,
            keywords,
            summary: resolution.summary,
            norm_isbn,
            batch,
        });
    }
    out
}

fn write_batch_file(workdir: &Path, batch: usize, rows: &[ResolvedRow]) -> Result<()> {
    let path = workdir.join(format!("{batch}.csv"));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(["isbn", "keywords", "summary", "norm_isbn", "batch"])?;
    for row in rows {
        let batch_field = row.batch.to_string();
        writer.write_record([
            row.identifier.as_str(),
            row.keywords.as_str(),
            row.summary.as_str(),
            row.norm_isbn.as_str(),
            batch_field.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
