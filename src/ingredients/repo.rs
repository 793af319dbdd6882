use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Reference data is small and unpaginated; an optional case-insensitive
/// name prefix narrows the listing.
pub async fn list(db: &PgPool, name_prefix: Option<&str>) -> anyhow::Result<Vec<Ingredient>> {
    let rows = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, measurement_unit
        FROM ingredients
        WHERE ($1::TEXT IS NULL OR name ILIKE $1 || '%')
        ORDER BY name
        "#,
    )
    .bind(name_prefix)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Ingredient>> {
    let ingredient = sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(ingredient)
}

/// How many of the given ingredient ids actually exist.
pub async fn count_existing(db: &PgPool, ids: &[i64]) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// One-shot bulk insert used by the reference-data loader. All rows go in
/// a single transaction; re-running the loader appends duplicates.
pub async fn bulk_insert(db: &PgPool, rows: &[(String, String)]) -> anyhow::Result<usize> {
    let mut tx = db.begin().await?;
    for (name, unit) in rows {
        sqlx::query("INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2)")
            .bind(name)
            .bind(unit)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(rows.len())
}
