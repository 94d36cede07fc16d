//! SQLite access for the catalog: read paths for the serving layer and the
//! one-shot loader that builds the `book` table from a merged spreadsheet.

use anyhow::{ensure, Context, Result};
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, SqliteConnection};
use std::path::Path;

/// One row as the API serves it. Insertion order follows the table's column
/// order, and serde keeps that order in the JSON output.
pub type BookRow = IndexMap<String, Value>;

/// Handle for the serving layer: opens one read-only connection per call and
/// drops it on return. The catalog is a single table touched by single
/// statements, so there is nothing for a pool to amortize.
#[derive(Clone)]
pub struct Db {
    options: SqliteConnectOptions,
}

impl Db {
    pub fn open(path: &Path) -> Self {
        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        Self { options }
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        self.options
            .clone()
            .connect()
            .await
            .context("failed to open catalog database")
    }

    pub async fn count_books(&self) -> Result<i64> {
        let mut conn = self.connect().await?;
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM book")
            .fetch_one(&mut conn)
            .await?;
        Ok(count)
    }

    /// Default listing: described books only, newest acquisitions first.
    pub async fn list_described(&self, limit: i64) -> Result<Vec<BookRow>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(
            "SELECT * FROM book
             WHERE description IS NOT NULL AND description != ''
             ORDER BY AccDate DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&mut conn)
        .await?;
        rows.iter().map(row_to_map).collect()
    }

    /// `sort=accession` listing: every row, accession-number order.
    pub async fn list_by_accession(&self, limit: i64) -> Result<Vec<BookRow>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query("SELECT * FROM book ORDER BY AccNo ASC LIMIT ?")
            .bind(limit)
            .fetch_all(&mut conn)
            .await?;
        rows.iter().map(row_to_map).collect()
    }

    /// Point lookup: the caller's identifier may be any of the four
    /// identifier columns.
    pub async fn find_book(&self, id: &str) -> Result<Option<BookRow>> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(
            "SELECT * FROM book WHERE ISBN = ? OR isbn13 = ? OR AccNo = ? OR ClassNo = ?",
        )
        .bind(id)
        .bind(id)
        .bind(id)
        .bind(id)
        .fetch_optional(&mut conn)
        .await?;
        row.as_ref().map(row_to_map).transpose()
    }
}

fn row_to_map(row: &SqliteRow) -> Result<BookRow> {
    let mut map = IndexMap::with_capacity(row.len());
    for column in row.columns() {
        let value: Option<String> = row.try_get(column.ordinal())?;
        map.insert(
            column.name().to_string(),
            value.map_or(Value::Null, Value::String),
        );
    }
    Ok(map)
}

/// Replace the `book` table with the contents of a merged spreadsheet. The
/// pipeline's `summary` column lands in the table as `description`. Returns
/// the number of rows written.
pub async fn load_catalog(db_path: &Path, source: &Path) -> Result<usize> {
    let (headers, rows) = crate::pipeline::read_table(source)?;
    ensure!(!headers.is_empty(), "source table has no columns");

    let columns: Vec<String> = headers
        .iter()
        .map(|h| if h == "summary" { "description" } else { h })
        .map(quote_ident)
        .collect();
    let create = format!("CREATE TABLE book ({} TEXT)", columns.join(" TEXT, "));
    let placeholders = vec!["?"; columns.len()].join(", ");
    let insert = format!("INSERT INTO book VALUES ({placeholders})");

    let mut conn = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .connect()
        .await
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let mut tx = conn.begin().await?;
    sqlx::query("DROP TABLE IF EXISTS book")
        .execute(&mut *tx)
        .await?;
    sqlx::query(&create).execute(&mut *tx).await?;
    for record in &rows {
        let mut query = sqlx::query(&insert);
        for field in record.iter() {
            query = query.bind(field);
        }
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!(rows = rows.len(), table = "book", "catalog loaded");
    Ok(rows.len())
}

// "Index" is an SQL keyword, so every identifier gets quoted.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
