use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod repo;

pub use model::{Favorite, FavoriteRequest, ToggleResponse};

pub fn router() -> Router<AppState> {
    handlers::favorite_routes()
}
