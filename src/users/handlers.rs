use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{
    CreateUserRequest, RecipesLimitQuery, SetPasswordRequest, SubscriptionDto, UserDto,
};
use super::repo;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthUser, MaybeUser};
use crate::error::{is_unique_violation, ApiError};
use crate::pagination::{Page, PageQuery};
use crate::recipes;
use crate::state::AppState;
use crate::validation::{is_valid_email, MIN_PASSWORD_LENGTH};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route("/users/me", get(me))
        .route("/users/set_password", post(set_password))
        .route("/users/subscriptions", get(subscriptions))
        .route("/users/:id", get(get_user))
        .route("/users/:id/subscribe", post(subscribe).delete(unsubscribe))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.username.trim().is_empty() {
        return Err(ApiError::Validation("Username is required".into()));
    }
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "First name and last name are required".into(),
        ));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    // Pre-write checks; the unique indexes back them up under races.
    if repo::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Duplicate("Email already registered".into()));
    }
    if repo::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Duplicate("Username already taken".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = repo::create(
        &state.db,
        &repo::NewUser {
            email: &payload.email,
            username: &payload.username,
            first_name: &payload.first_name,
            last_name: &payload.last_name,
            password_hash: &hash,
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Duplicate("Email or username already taken".into())
        } else {
            ApiError::from(e)
        }
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(UserDto::from_user(&user, false))))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(p): Query<PageQuery>,
) -> Result<Json<Page<UserDto>>, ApiError> {
    let limit = p.limit_or(state.config.page_size);
    let users = repo::list(&state.db, limit, p.offset(limit)).await?;
    let count = repo::count(&state.db).await?;

    let mut results = Vec::with_capacity(users.len());
    for user in &users {
        let is_subscribed = match viewer {
            Some(viewer_id) => repo::is_subscribed(&state.db, viewer_id, user.id).await?,
            None => false,
        };
        results.push(UserDto::from_user(user, is_subscribed));
    }
    Ok(Json(Page::new("/api/users", &p, limit, count, results)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<UserDto>, ApiError> {
    let user = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let is_subscribed = match viewer {
        Some(viewer_id) => repo::is_subscribed(&state.db, viewer_id, user.id).await?,
        None => false,
    };
    Ok(Json(UserDto::from_user(&user, is_subscribed)))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserDto>, ApiError> {
    let user = repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    Ok(Json(UserDto::from_user(&user, false)))
}

#[instrument(skip(state, payload))]
pub async fn set_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user = repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(ApiError::Validation("Wrong current password".into()));
    }
    if payload.new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation("Password too short".into()));
    }

    let hash = hash_password(&payload.new_password)?;
    repo::update_password(&state.db, user_id, &hash).await?;
    info!(user_id = %user_id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(author_id): Path<i64>,
    Query(q): Query<RecipesLimitQuery>,
) -> Result<(StatusCode, Json<SubscriptionDto>), ApiError> {
    let author = repo::find_by_id(&state.db, author_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Checked here first; the store's check constraint is the backstop.
    if author.id == user_id {
        return Err(ApiError::Validation(
            "You cannot subscribe to yourself".into(),
        ));
    }

    repo::subscribe(&state.db, user_id, author.id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Duplicate("You are already subscribed to this user".into())
            } else {
                ApiError::from(e)
            }
        })?;

    info!(user_id = %user_id, author_id = %author.id, "subscribed");
    let dto = subscription_dto(&state, &author, q.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(author_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let author = repo::find_by_id(&state.db, author_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let removed = repo::unsubscribe(&state.db, user_id, author.id).await?;
    if !removed {
        return Err(ApiError::NotFound("Subscription not found".into()));
    }
    info!(user_id = %user_id, author_id = %author.id, "unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn subscriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<PageQuery>,
    Query(q): Query<RecipesLimitQuery>,
) -> Result<Json<Page<SubscriptionDto>>, ApiError> {
    let limit = p.limit_or(state.config.page_size);
    let authors = repo::list_subscribed_authors(&state.db, user_id, limit, p.offset(limit)).await?;
    let count = repo::count_subscriptions(&state.db, user_id).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(subscription_dto(&state, author, q.recipes_limit).await?);
    }
    Ok(Json(Page::new(
        "/api/users/subscriptions",
        &p,
        limit,
        count,
        results,
    )))
}

async fn subscription_dto(
    state: &AppState,
    author: &repo::User,
    recipes_limit: Option<i64>,
) -> anyhow::Result<SubscriptionDto> {
    let recipes = recipes::repo::list_by_author(&state.db, author.id, recipes_limit).await?;
    let recipes_count = recipes::repo::count_by_author(&state.db, author.id).await?;
    Ok(SubscriptionDto {
        user: UserDto::from_user(author, true),
        recipes: recipes
            .into_iter()
            .map(recipes::dto::RecipeMinified::from)
            .collect(),
        recipes_count,
    })
}
