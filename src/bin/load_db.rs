// One-shot loader: merged spreadsheet -> SQLite `book` table

use anyhow::Result;
use bookdex::db::load_catalog;
use bookdex::util::env as env_util;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "load_db",
    version,
    about = "Replace the catalog database with a merged spreadsheet"
)]
struct Cli {
    /// Merged CSV to load
    #[arg(default_value = "Final_Data.csv")]
    source: PathBuf,

    /// Database file to (re)create (defaults to BOOKS_DB)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(env_util::db_path);

    let rows = load_catalog(&db_path, &cli.source).await?;
    tracing::info!(rows, source = %cli.source.display(), "book table replaced");
    println!("{} created!", db_path.display());
    Ok(())
}
