use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod repo;

pub use model::{Comment, NewComment, MAX_COMMENT_LEN};

pub fn router() -> Router<AppState> {
    handlers::comment_routes()
}
