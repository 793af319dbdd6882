use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String, // Argon2 hash, never serialized
    pub created_at: OffsetDateTime,
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, first_name, last_name, password_hash, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, first_name, last_name, password_hash, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, first_name, last_name, password_hash, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

/// Create a new user with hashed password. Unique violations (email or
/// username already taken) surface as sqlx database errors for the handler
/// to map.
pub async fn create(db: &PgPool, new: &NewUser<'_>) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, username, first_name, last_name, password_hash, created_at
        "#,
    )
    .bind(new.email)
    .bind(new.username)
    .bind(new.first_name)
    .bind(new.last_name)
    .bind(new.password_hash)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, first_name, last_name, password_hash, created_at
        FROM users
        ORDER BY id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    Ok(count)
}

pub async fn update_password(db: &PgPool, user_id: i64, password_hash: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

// ---- Subscriptions ----

/// Insert a follow edge. The unique pair constraint rejects duplicates; the
/// check constraint is the store-level backstop against self-follows.
pub async fn subscribe(db: &PgPool, user_id: i64, author_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Returns false when no such subscription existed.
pub async fn unsubscribe(db: &PgPool, user_id: i64, author_id: i64) -> anyhow::Result<bool> {
    let done = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn is_subscribed(db: &PgPool, user_id: i64, author_id: i64) -> anyhow::Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND author_id = $2)",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// Authors the user follows, newest subscription first.
pub async fn list_subscribed_authors(
    db: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
               u.password_hash, u.created_at
        FROM subscriptions s
        JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY s.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_subscriptions(db: &PgPool, user_id: i64) -> anyhow::Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}
