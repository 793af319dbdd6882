use sqlx::postgres::PgPoolOptions;

use recipebox::tags::loader;

/// Seeds the tag table from a comma-separated file.
///
/// Usage: `load_tags [path]` (defaults to `data/tags.csv`).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "recipebox=info,sqlx=warn".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/tags.csv".to_string());

    let database_url = std::env::var("DATABASE_URL")?;
    let db = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let inserted = loader::load_file(&db, &path).await?;
    tracing::info!(inserted, path = %path, "tags loaded");
    Ok(())
}
