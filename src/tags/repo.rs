use sqlx::{FromRow, PgPool};

use crate::error::ApiError;
use crate::validation::{is_valid_hex_color, is_valid_slug};

#[derive(Debug, Clone, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Tag>> {
    let rows = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Tag>> {
    let tag = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(tag)
}

/// How many of the given tag ids actually exist.
pub async fn count_existing(db: &PgPool, ids: &[i64]) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Used by the `load_tags` seeding binary. Field rules are checked here
/// before the insert; the unique and check constraints in the schema
/// enforce the same rules at the store level.
pub async fn create(db: &PgPool, name: &str, color: &str, slug: &str) -> Result<Tag, ApiError> {
    validate_fields(name, color, slug)?;
    let tag = sqlx::query_as::<_, Tag>(
        r#"
        INSERT INTO tags (name, color, slug)
        VALUES ($1, $2, $3)
        RETURNING id, name, color, slug
        "#,
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .fetch_one(db)
    .await
    .map_err(|e| {
        if crate::error::is_unique_violation(&e) {
            ApiError::Duplicate("Tag name, color and slug must be unique".into())
        } else {
            ApiError::from(e)
        }
    })?;
    Ok(tag)
}

pub fn validate_fields(name: &str, color: &str, slug: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("Tag name is required".into()));
    }
    if !is_valid_hex_color(color) {
        return Err(ApiError::Validation(format!(
            "{color} is not a hex color code"
        )));
    }
    if !is_valid_slug(slug) {
        return Err(ApiError::Validation(format!("{slug} is not a valid slug")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_tag_fields() {
        assert!(validate_fields("Breakfast", "#AABBCC", "breakfast").is_ok());
    }

    #[test]
    fn rejects_non_hex_color() {
        let err = validate_fields("Breakfast", "notacolor", "breakfast").unwrap_err();
        assert!(err.to_string().contains("not a hex color"));
    }

    #[test]
    fn rejects_bad_slug_and_empty_name() {
        assert!(validate_fields("Breakfast", "#AABBCC", "no spaces allowed").is_err());
        assert!(validate_fields("  ", "#AABBCC", "breakfast").is_err());
    }
}
