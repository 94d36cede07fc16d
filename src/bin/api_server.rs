// HTTP API server binary for the book catalog

use anyhow::Result;
use bookdex::api::ApiServer;
use bookdex::db::Db;
use bookdex::util::env as env_util;

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    env_util::init_env();

    let server = ApiServer::from_env();
    let db_path = env_util::db_path();
    tracing::info!(db = %db_path.display(), "serving book catalog");
    let db = Db::open(&db_path);

    server.run(db).await?;

    Ok(())
}
