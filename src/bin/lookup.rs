// Ad-hoc resolver run for a single identifier

use anyhow::Result;
use bookdex::resolver::Resolver;
use bookdex::util::env as env_util;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lookup",
    version,
    about = "Resolve summary and keywords for one identifier"
)]
struct Cli {
    /// ISBN-10, ISBN-13, or anything the normalizer can pad
    identifier: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    let resolver = Resolver::new()?;
    let resolution = resolver.resolve(&cli.identifier).await;

    for (source, outcome) in &resolution.stages {
        tracing::info!(source = %source, outcome = ?outcome, "stage finished");
    }

    println!("identifier: {}", resolution.identifier);
    println!("keywords:   {}", resolution.keywords_joined());
    println!("summary:    {}", resolution.summary);
    Ok(())
}
