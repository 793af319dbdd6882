use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::tags::repo::Tag;

#[derive(Debug, Clone, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub author_id: Option<i64>,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: OffsetDateTime,
}

/// One ingredient line of a recipe, already joined with the reference row.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeIngredientRow {
    pub id: i64, // ingredient id
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One raw cart line: ingredient identity plus the per-recipe amount.
/// Aggregation across recipes happens in `shopping_list`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub favorited_by: Option<i64>,
    pub in_cart_of: Option<i64>,
}

const RECIPE_COLUMNS: &str = "id, author_id, name, image, text, cooking_time, created_at";

pub async fn list(
    db: &PgPool,
    filter: &RecipeFilter,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
        FROM recipes
        WHERE ($1::BIGINT IS NULL OR author_id = $1)
          AND ($2::BIGINT IS NULL
               OR id IN (SELECT recipe_id FROM favourites WHERE user_id = $2))
          AND ($3::BIGINT IS NULL
               OR id IN (SELECT recipe_id FROM shopping_carts WHERE user_id = $3))
          AND (cardinality($4::TEXT[]) = 0
               OR id IN (SELECT rt.recipe_id
                         FROM recipe_tags rt
                         JOIN tags t ON t.id = rt.tag_id
                         WHERE t.slug = ANY($4)))
        ORDER BY id DESC
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(filter.author)
    .bind(filter.favorited_by)
    .bind(filter.in_cart_of)
    .bind(&filter.tags)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count(db: &PgPool, filter: &RecipeFilter) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM recipes
        WHERE ($1::BIGINT IS NULL OR author_id = $1)
          AND ($2::BIGINT IS NULL
               OR id IN (SELECT recipe_id FROM favourites WHERE user_id = $2))
          AND ($3::BIGINT IS NULL
               OR id IN (SELECT recipe_id FROM shopping_carts WHERE user_id = $3))
          AND (cardinality($4::TEXT[]) = 0
               OR id IN (SELECT rt.recipe_id
                         FROM recipe_tags rt
                         JOIN tags t ON t.id = rt.tag_id
                         WHERE t.slug = ANY($4)))
        "#,
    )
    .bind(filter.author)
    .bind(filter.favorited_by)
    .bind(filter.in_cart_of)
    .bind(&filter.tags)
    .fetch_one(db)
    .await?;
    Ok(count)
}

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(recipe)
}

pub struct NewRecipe<'a> {
    pub author_id: i64,
    pub name: &'a str,
    pub image: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
}

/// Inserts the recipe row and both join tables in one transaction.
pub async fn create(
    db: &PgPool,
    new: &NewRecipe<'_>,
    tags: &[i64],
    ingredients: &[(i64, i32)],
) -> anyhow::Result<Recipe> {
    let mut tx = db.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(new.author_id)
    .bind(new.name)
    .bind(new.image)
    .bind(new.text)
    .bind(new.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }
    for (ingredient_id, amount) in ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe.id)
        .bind(ingredient_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(recipe)
}

/// Rewrites the recipe row and replaces both join tables in one transaction.
pub async fn update(
    db: &PgPool,
    id: i64,
    new: &NewRecipe<'_>,
    tags: &[i64],
    ingredients: &[(i64, i32)],
) -> anyhow::Result<Recipe> {
    let mut tx = db.begin().await?;

    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        UPDATE recipes
        SET name = $2, image = $3, text = $4, cooking_time = $5
        WHERE id = $1
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(new.name)
    .bind(new.image)
    .bind(new.text)
    .bind(new.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    for tag_id in tags {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }
    for (ingredient_id, amount) in ingredients {
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(ingredient_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(recipe)
}

/// The schema cascades the join rows (ingredients, tags, favourites, carts).
pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn tags_for_recipe(db: &PgPool, recipe_id: i64) -> anyhow::Result<Vec<Tag>> {
    let rows = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn ingredients_for_recipe(
    db: &PgPool,
    recipe_id: i64,
) -> anyhow::Result<Vec<RecipeIngredientRow>> {
    let rows = sqlx::query_as::<_, RecipeIngredientRow>(
        r#"
        SELECT i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Recipe previews for an author, newest first, optionally truncated.
/// Non-positive limits read as "no limit"; `LIMIT NULL` returns everything.
pub async fn list_by_author(
    db: &PgPool,
    author_id: i64,
    limit: Option<i64>,
) -> anyhow::Result<Vec<Recipe>> {
    let limit = limit.filter(|l| *l > 0);
    let rows = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
        FROM recipes
        WHERE author_id = $1
        ORDER BY id DESC
        LIMIT $2
        "#
    ))
    .bind(author_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_by_author(db: &PgPool, author_id: i64) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

// ---- Favourites / shopping cart ----

pub async fn is_favorited(db: &PgPool, user_id: i64, recipe_id: i64) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM favourites WHERE user_id = $1 AND recipe_id = $2)",
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn is_in_cart(db: &PgPool, user_id: i64, recipe_id: i64) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM shopping_carts WHERE user_id = $1 AND recipe_id = $2)",
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// Duplicate pairs are rejected by the unique constraint; the handler maps
/// the violation to a 400.
pub async fn add_favourite(db: &PgPool, user_id: i64, recipe_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO favourites (user_id, recipe_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_favourite(db: &PgPool, user_id: i64, recipe_id: i64) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM favourites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn add_to_cart(db: &PgPool, user_id: i64, recipe_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO shopping_carts (user_id, recipe_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_from_cart(db: &PgPool, user_id: i64, recipe_id: i64) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM shopping_carts WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

/// Every ingredient line of every recipe in the user's cart, unaggregated.
pub async fn cart_ingredient_rows(
    db: &PgPool,
    user_id: i64,
) -> anyhow::Result<Vec<CartIngredientRow>> {
    let rows = sqlx::query_as::<_, CartIngredientRow>(
        r#"
        SELECT i.name, i.measurement_unit, ri.amount
        FROM shopping_carts sc
        JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
