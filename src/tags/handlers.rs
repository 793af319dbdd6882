use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::TagDto;
use super::repo;
use crate::error::ApiError;
use crate::state::AppState;

pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/:id", get(get_tag))
}

#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagDto>>, ApiError> {
    let tags = repo::list(&state.db).await?;
    Ok(Json(tags.into_iter().map(TagDto::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagDto>, ApiError> {
    let tag = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tag not found".into()))?;
    Ok(Json(TagDto::from(tag)))
}
