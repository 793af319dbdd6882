pub mod dto;
pub mod handlers;
pub mod loader;
pub mod repo;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::tag_routes()
}
