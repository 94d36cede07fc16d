//! Job manifest: one record per identifier with a pending/done/failed
//! state, persisted in the working directory after every batch. This
//! replaces "remember which offset you passed last time" as the resumption
//! story; the explicit offset argument still works and wins when given.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "jobs.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Zero-based position in the source table.
    pub row: usize,
    pub identifier: String,
    pub batch: usize,
    pub status: JobStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub source: String,
    pub batch_size: usize,
    pub total_rows: usize,
    pub generated_at: DateTime<Utc>,
    pub jobs: Vec<Job>,
}

impl Manifest {
    pub fn build(source: &Path, batch_size: usize, identifiers: &[String]) -> Self {
        let jobs = identifiers
            .iter()
            .enumerate()
            .map(|(row, identifier)| Job {
                row,
                identifier: identifier.clone(),
                batch: row / batch_size,
                status: JobStatus::Pending,
            })
            .collect();
        Self {
            source: source.display().to_string(),
            batch_size,
            total_rows: identifiers.len(),
            generated_at: Utc::now(),
            jobs,
        }
    }

    /// Load the manifest from `workdir`, falling back to a fresh one when it
    /// is absent, unreadable, or no longer matches the source table. A
    /// resumed run keeps the manifest's batch size even when the requested
    /// one differs — changing it midway would corrupt the join keys.
    pub fn load_or_build(
        workdir: &Path,
        source: &Path,
        batch_size: usize,
        identifiers: &[String],
    ) -> Self {
        match fs::read_to_string(manifest_path(workdir)) {
            Ok(raw) => match serde_json::from_str::<Manifest>(&raw) {
                Ok(manifest)
                    if manifest.source == source.display().to_string()
                        && manifest.total_rows == identifiers.len() =>
                {
                    if manifest.batch_size != batch_size {
                        tracing::warn!(
                            manifest = manifest.batch_size,
                            requested = batch_size,
                            "resuming with the manifest's batch size"
                        );
                    }
                    manifest
                }
                Ok(manifest) => {
                    tracing::warn!(
                        manifest_source = %manifest.source,
                        manifest_rows = manifest.total_rows,
                        source_rows = identifiers.len(),
                        "manifest no longer matches the source table; rebuilding"
                    );
                    Self::build(source, batch_size, identifiers)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable manifest; rebuilding");
                    Self::build(source, batch_size, identifiers)
                }
            },
            Err(_) => Self::build(source, batch_size, identifiers),
        }
    }

    pub fn save(&self, workdir: &Path) -> Result<()> {
        let path = manifest_path(workdir);
        let body = serde_json::to_string_pretty(self).context("failed to serialize manifest")?;
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn n_batches(&self) -> usize {
        self.total_rows.div_ceil(self.batch_size)
    }

    /// A batch is complete when it exists and none of its jobs is pending.
    pub fn batch_complete(&self, batch: usize) -> bool {
        let mut saw_any = false;
        for job in self.jobs.iter().filter(|j| j.batch == batch) {
            saw_any = true;
            if job.status == JobStatus::Pending {
                return false;
            }
        }
        saw_any
    }

    pub fn mark(&mut self, row: usize, status: JobStatus) {
        if let Some(job) = self.jobs.get_mut(row) {
            job.status = status;
        }
    }
}

pub fn manifest_path(workdir: &Path) -> PathBuf {
    workdir.join(MANIFEST_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("97800000{i:04}")).collect()
    }

    #[test]
    fn build_assigns_batches_and_pending_state() {
        let manifest = Manifest::build(Path::new("books.csv"), 10, &ids(23));
        assert_eq!(manifest.n_batches(), 3);
        assert_eq!(manifest.jobs[9].batch, 0);
        assert_eq!(manifest.jobs[10].batch, 1);
        assert!(manifest
            .jobs
            .iter()
            .all(|j| j.status == JobStatus::Pending));
    }

    #[test]
    fn round_trips_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let identifiers = ids(12);
        let mut manifest = Manifest::build(Path::new("books.csv"), 10, &identifiers);
        for row in 0..10 {
            manifest.mark(row, JobStatus::Done);
        }
        manifest.mark(3, JobStatus::Failed);
        manifest.save(dir.path()).unwrap();

        let loaded =
            Manifest::load_or_build(dir.path(), Path::new("books.csv"), 10, &identifiers);
        assert!(loaded.batch_complete(0));
        assert!(!loaded.batch_complete(1));
        assert_eq!(loaded.jobs[3].status, JobStatus::Failed);
    }

    #[test]
    fn mismatched_manifest_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = Manifest::build(Path::new("books.csv"), 10, &ids(12));
        manifest.save(dir.path()).unwrap();

        let reloaded = Manifest::load_or_build(dir.path(), Path::new("books.csv"), 10, &ids(15));
        assert_eq!(reloaded.total_rows, 15);
        assert!(reloaded
            .jobs
            .iter()
            .all(|j| j.status == JobStatus::Pending));
    }

    #[test]
    fn manifest_for_a_different_source_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let identifiers = ids(12);
        let mut manifest = Manifest::build(Path::new("books.csv"), 10, &identifiers);
        manifest.mark(0, JobStatus::Done);
        manifest.save(dir.path()).unwrap();

        // books.tsv shares the workdir stem but is a different table.
        let reloaded =
            Manifest::load_or_build(dir.path(), Path::new("books.tsv"), 10, &identifiers);
        assert_eq!(reloaded.source, "books.tsv");
        assert!(reloaded
            .jobs
            .iter()
            .all(|j| j.status == JobStatus::Pending));
    }

    #[test]
    fn out_of_range_batch_is_not_complete() {
        let manifest = Manifest::build(Path::new("books.csv"), 10, &ids(5));
        assert!(!manifest.batch_complete(7));
    }
}
