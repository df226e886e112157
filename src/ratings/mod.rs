use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod repo;

pub use model::{aggregate, RateRequest, Rating};

pub fn router() -> Router<AppState> {
    handlers::rating_routes()
}
