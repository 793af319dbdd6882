use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{IngredientDto, IngredientFilter};
use super::repo;
use crate::error::ApiError;
use crate::state::AppState;

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients))
        .route("/ingredients/:id", get(get_ingredient))
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(filter): Query<IngredientFilter>,
) -> Result<Json<Vec<IngredientDto>>, ApiError> {
    let rows = repo::list(&state.db, filter.name.as_deref()).await?;
    Ok(Json(rows.into_iter().map(IngredientDto::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<IngredientDto>, ApiError> {
    let ingredient = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ingredient not found".into()))?;
    Ok(Json(IngredientDto::from(ingredient)))
}
