pub mod dto;
pub mod handlers;
pub mod repo;
pub mod shopping_list;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
