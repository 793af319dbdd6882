use sqlx::postgres::PgPoolOptions;

use recipebox::ingredients::loader;

/// One-shot import of the ingredient reference data.
///
/// Usage: `load_ingredients [path]` (defaults to `data/ingredients.csv`).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "recipebox=info,sqlx=warn".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/ingredients.csv".to_string());

    let database_url = std::env::var("DATABASE_URL")?;
    let db = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let inserted = loader::load_file(&db, &path).await?;
    tracing::info!(inserted, path = %path, "ingredients loaded");
    Ok(())
}
