//! Joins the per-batch intermediate files back onto the source table and
//! writes the final `<name>_output.csv` next to it.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::{column_index, read_table, workdir_for};
use crate::normalization::isbn::normalize;

/// Left-join the scraped batches onto `source`, dedupe by `Index`, write
/// the merged file, and remove the working directory.
pub fn run(source: &Path, batch_size: usize) -> Result<PathBuf> {
    let (headers, rows) = read_table(source)?;
    let isbn_col = column_index(&headers, "ISBN")?;
    let index_col = column_index(&headers, "Index")?;

    let workdir = workdir_for(source);
    let n_batches = rows.len().div_ceil(batch_size);
    let scraped = load_intermediates(&workdir, n_batches)?;

    let out_path = output_path(source);
    let mut writer = csv::Writer::from_path(&out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;

    let mut out_headers: Vec<&str> = headers.iter().collect();
    out_headers.extend(["keywords", "summary", "isbn13"]);
    writer.write_record(&out_headers)?;

    let mut seen_index = HashSet::new();
    for record in &rows {
        let raw_index = record.get(index_col).unwrap_or_default().trim();
        let row_index: i64 = raw_index
            .parse()
            .with_context(|| format!("non-numeric Index value '{raw_index}'"))?;
        if !seen_index.insert(row_index) {
            continue;
        }

        // Same assignment the driver used: 1-based index, floor division.
        let batch = (row_index - 1).div_euclid(batch_size as i64);
        let norm = normalize(record.get(isbn_col).unwrap_or_default().trim());
        let (keywords, summary) = scraped
            .get(&(batch, norm.clone()))
            .cloned()
            .unwrap_or_default();

        let mut out_record: Vec<&str> = record.iter().collect();
        out_record.push(&keywords);
        out_record.push(&summary);
        out_record.push(&norm);
        writer.write_record(&out_record)?;
    }
    writer.flush()?;

    println!("Files merged into {}", out_path.display());
    fs::remove_dir_all(&workdir)
        .with_context(|| format!("failed to remove working dir {}", workdir.display()))?;
    Ok(out_path)
}

/// `(batch, normalized isbn) -> (keywords, summary)`, first match wins so
/// repeated identifiers within a batch behave like a keep-first join.
fn load_intermediates(
    workdir: &Path,
    n_batches: usize,
) -> Result<HashMap<(i64, String), (String, String)>> {
    let mut scraped = HashMap::new();
    for batch in 0..n_batches {
        let path = workdir.join(format!("{batch}.csv"));
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("missing intermediate file {}", path.display()))?;
        for record in reader.records() {
            let record = record.context("malformed intermediate row")?;
            let norm = record.get(3).unwrap_or_default().to_string();
            let keywords = record.get(1).unwrap_or_default().to_string();
            let summary = record.get(2).unwrap_or_default().to_string();
            scraped
                .entry((batch as i64, norm))
                .or_insert_with(|| (keywords, summary));
        }
    }
    Ok(scraped)
}

fn output_path(source: &Path) -> PathBuf {
    let mut name = workdir_for(source).into_os_string();
    name.push("_output.csv");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_source(dir: &Path, rows: usize) -> PathBuf {
        let path = dir.join("accessions.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "Index,AccNo,ISBN").unwrap();
        for i in 1..=rows {
            writeln!(file, "{i},A{i},97800000000{i:02}").unwrap();
        }
        path
    }

    fn write_batch(workdir: &Path, batch: usize, rows: &[[&str; 5]]) {
        let mut writer = csv::Writer::from_path(workdir.join(format!("{batch}.csv"))).unwrap();
        writer
            .write_record(["isbn", "keywords", "summary", "norm_isbn", "batch"])
            .unwrap();
        for row in rows {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn merges_left_joining_and_deduping() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 12);
        let workdir = workdir_for(&source);
        fs::create_dir_all(&workdir).unwrap();
        write_batch(
            &workdir,
            0,
            &[
                ["9780000000001", "First Keys", "first summary", "9780000000001", "0"],
                ["9780000000001", "Dupe", "dupe summary", "9780000000001", "0"],
            ],
        );
        write_batch(
            &workdir,
            1,
            &[["9780000000011", "Late", "late summary", "9780000000011", "1"]],
        );

        let out_path = run(&source, 10).unwrap();

        let mut reader = csv::Reader::from_path(&out_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["Index", "AccNo", "ISBN", "keywords", "summary", "isbn13"]
        );
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 12);
        // First occurrence of a duplicated key wins.
        assert_eq!(&records[0][3], "First Keys");
        // Unmatched rows still come through, with empty enrichment.
        assert_eq!(&records[1][3], "");
        // Row 11 sits in batch 1 and picks up that batch's scrape.
        assert_eq!(&records[10][4], "late summary");
        assert_eq!(&records[5][5], "9780000000006");
        assert!(!workdir.exists());
    }

    #[test]
    fn duplicate_index_keeps_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("dups.csv");
        let mut file = fs::File::create(&source).unwrap();
        writeln!(file, "Index,ISBN").unwrap();
        writeln!(file, "1,9780000000001").unwrap();
        writeln!(file, "1,9780000000002").unwrap();
        writeln!(file, "2,9780000000003").unwrap();
        drop(file);

        let workdir = workdir_for(&source);
        fs::create_dir_all(&workdir).unwrap();
        write_batch(
            &workdir,
            0,
            &[["9780000000001", "Kept", "kept", "9780000000001", "0"]],
        );

        let out_path = run(&source, 10).unwrap();
        let mut reader = csv::Reader::from_path(&out_path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "9780000000001");
        assert_eq!(&records[0][2], "Kept");
    }

    #[test]
    fn missing_intermediate_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path(), 12);
        let workdir = workdir_for(&source);
        fs::create_dir_all(&workdir).unwrap();
        write_batch(&workdir, 0, &[]);
        // Batch 1 never got written.

        let err = run(&source, 10).unwrap_err();
        assert!(err.to_string().contains("missing intermediate file"));
    }
}
