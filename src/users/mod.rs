use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod repo;

pub use model::{ProfilePatch, PublicUser, User, DEFAULT_AVATAR};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
