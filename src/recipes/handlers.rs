use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    media_url, RecipeDto, RecipeIngredientDto, RecipeListQuery, RecipeMinified, RecipePayload,
};
use super::repo;
use super::shopping_list;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::{is_unique_violation, ApiError};
use crate::ingredients;
use crate::media::{decode_data_url, recipe_image_key};
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;
use crate::tags::{self, dto::TagDto};
use crate::users;
use crate::validation::{check_amount, check_cooking_time};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/download_shopping_cart",
            get(download_shopping_cart),
        )
        .route(
            "/recipes/:id",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
        // base64 images ride inside the JSON body
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Page<RecipeDto>>, ApiError> {
    let q = RecipeListQuery::from_pairs(&pairs);
    let page_query = PageQuery {
        page: q.page,
        limit: q.limit,
    };
    let limit = page_query.limit_or(state.config.page_size);
    let filter = q.filter_for(viewer);

    let recipes = repo::list(&state.db, &filter, limit, page_query.offset(limit)).await?;
    let count = repo::count(&state.db, &filter).await?;

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        results.push(recipe_dto(&state, viewer, recipe).await?);
    }
    Ok(Json(Page::new(
        "/api/recipes",
        &page_query,
        limit,
        count,
        results,
    )))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDto>, ApiError> {
    let recipe = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;
    Ok(Json(recipe_dto(&state, viewer, recipe).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeDto>), ApiError> {
    let (tag_ids, ingredient_amounts) = validate_payload(&state, &payload).await?;

    let data_url = payload
        .image
        .as_deref()
        .ok_or_else(|| ApiError::Validation("Image is required".into()))?;
    let image = decode_data_url(data_url)?;
    let image_key = recipe_image_key(image.extension);
    state.media.save(&image_key, image.bytes).await?;

    let recipe = repo::create(
        &state.db,
        &repo::NewRecipe {
            author_id: user_id,
            name: payload.name.trim(),
            image: &image_key,
            text: &payload.text,
            cooking_time: payload.cooking_time,
        },
        &tag_ids,
        &ingredient_amounts,
    )
    .await?;

    info!(recipe_id = %recipe.id, user_id = %user_id, "recipe created");
    let dto = recipe_dto(&state, Some(user_id), recipe).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeDto>, ApiError> {
    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;
    if existing.author_id != Some(user_id) {
        return Err(ApiError::Forbidden(
            "Only the author can edit this recipe".into(),
        ));
    }

    let (tag_ids, ingredient_amounts) = validate_payload(&state, &payload).await?;

    // A new image replaces the stored file; otherwise the old one is kept.
    let image_key = match payload.image.as_deref() {
        Some(data_url) => {
            let image = decode_data_url(data_url)?;
            let key = recipe_image_key(image.extension);
            state.media.save(&key, image.bytes).await?;
            state.media.delete(&existing.image).await?;
            key
        }
        None => existing.image.clone(),
    };

    let recipe = repo::update(
        &state.db,
        id,
        &repo::NewRecipe {
            author_id: user_id,
            name: payload.name.trim(),
            image: &image_key,
            text: &payload.text,
            cooking_time: payload.cooking_time,
        },
        &tag_ids,
        &ingredient_amounts,
    )
    .await?;

    info!(recipe_id = %id, user_id = %user_id, "recipe updated");
    Ok(Json(recipe_dto(&state, Some(user_id), recipe).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let recipe = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;
    if recipe.author_id != Some(user_id) {
        return Err(ApiError::Forbidden(
            "Only the author can delete this recipe".into(),
        ));
    }

    repo::delete(&state.db, id).await?;
    state.media.delete(&recipe.image).await?;
    info!(recipe_id = %id, user_id = %user_id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeMinified>), ApiError> {
    let recipe = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;

    repo::add_favourite(&state.db, user_id, recipe.id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Duplicate("Recipe is already in favorites".into())
            } else {
                ApiError::from(e)
            }
        })?;

    info!(recipe_id = %recipe.id, user_id = %user_id, "recipe favorited");
    Ok((StatusCode::CREATED, Json(RecipeMinified::from(recipe))))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let recipe = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;

    let removed = repo::remove_favourite(&state.db, user_id, recipe.id).await?;
    if !removed {
        return Err(ApiError::NotFound("Recipe is not in favorites".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<RecipeMinified>), ApiError> {
    let recipe = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;

    repo::add_to_cart(&state.db, user_id, recipe.id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Duplicate("Recipe is already in the shopping cart".into())
            } else {
                ApiError::from(e)
            }
        })?;

    info!(recipe_id = %recipe.id, user_id = %user_id, "recipe added to cart");
    Ok((StatusCode::CREATED, Json(RecipeMinified::from(recipe))))
}

#[instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let recipe = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".into()))?;

    let removed = repo::remove_from_cart(&state.db, user_id, recipe.id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "Recipe is not in the shopping cart".into(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, String), ApiError> {
    let rows = repo::cart_ingredient_rows(&state.db, user_id).await?;
    let items = shopping_list::aggregate(rows);
    let body = shopping_list::render(&items);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        "text/plain; charset=utf-8".parse().expect("static header"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        "attachment; filename=\"shopping_list.txt\""
            .parse()
            .expect("static header"),
    );
    Ok((headers, body))
}

/// Field-level checks shared by create and update. Returns the tag ids and
/// (ingredient id, amount) pairs ready for the repo.
async fn validate_payload(
    state: &AppState,
    payload: &RecipePayload,
) -> Result<(Vec<i64>, Vec<(i64, i32)>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Recipe name is required".into()));
    }
    if payload.text.trim().is_empty() {
        return Err(ApiError::Validation("Recipe text is required".into()));
    }
    check_cooking_time(payload.cooking_time)?;

    if payload.tags.is_empty() {
        return Err(ApiError::Validation("At least one tag is required".into()));
    }
    let mut tag_ids = payload.tags.clone();
    tag_ids.sort_unstable();
    tag_ids.dedup();
    if tag_ids.len() != payload.tags.len() {
        return Err(ApiError::Validation("Duplicate tags".into()));
    }
    if tags::repo::count_existing(&state.db, &tag_ids).await? != tag_ids.len() as i64 {
        return Err(ApiError::Validation("Unknown tag".into()));
    }

    if payload.ingredients.is_empty() {
        return Err(ApiError::Validation(
            "At least one ingredient is required".into(),
        ));
    }
    let mut ingredient_ids: Vec<i64> = payload.ingredients.iter().map(|i| i.id).collect();
    ingredient_ids.sort_unstable();
    ingredient_ids.dedup();
    if ingredient_ids.len() != payload.ingredients.len() {
        return Err(ApiError::Validation("Duplicate ingredients".into()));
    }
    for line in &payload.ingredients {
        check_amount(line.amount)?;
    }
    if ingredients::repo::count_existing(&state.db, &ingredient_ids).await?
        != ingredient_ids.len() as i64
    {
        return Err(ApiError::Validation("Unknown ingredient".into()));
    }

    Ok((
        payload.tags.clone(),
        payload.ingredients.iter().map(|i| (i.id, i.amount)).collect(),
    ))
}

/// Assembles the full representation: nested tags, author profile,
/// ingredient lines and the viewer-dependent flags.
async fn recipe_dto(
    state: &AppState,
    viewer: Option<i64>,
    recipe: repo::Recipe,
) -> anyhow::Result<RecipeDto> {
    let tags = repo::tags_for_recipe(&state.db, recipe.id).await?;
    let ingredient_rows = repo::ingredients_for_recipe(&state.db, recipe.id).await?;

    let author = match recipe.author_id {
        Some(author_id) => match users::repo::find_by_id(&state.db, author_id).await? {
            Some(author) => {
                let is_subscribed = match viewer {
                    Some(viewer_id) => {
                        users::repo::is_subscribed(&state.db, viewer_id, author_id).await?
                    }
                    None => false,
                };
                Some(users::dto::UserDto::from_user(&author, is_subscribed))
            }
            None => None,
        },
        None => None,
    };

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer_id) => (
            repo::is_favorited(&state.db, viewer_id, recipe.id).await?,
            repo::is_in_cart(&state.db, viewer_id, recipe.id).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDto {
        id: recipe.id,
        tags: tags.into_iter().map(TagDto::from).collect(),
        author,
        ingredients: ingredient_rows
            .into_iter()
            .map(RecipeIngredientDto::from)
            .collect(),
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: media_url(&recipe.image),
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}
