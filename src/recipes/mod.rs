use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod model;
pub mod repo;

#[cfg(test)]
pub(crate) use model::fixtures;
pub use model::{Category, Difficulty, Nutrition, Recipe, RecipeInput, RecipePatch};

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
