use axum::Router;

use crate::state::AppState;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use extractors::{AuthUser, MaybeUser};
pub use jwt::JwtKeys;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
