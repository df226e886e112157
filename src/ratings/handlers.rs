use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    model::{validate_score, RateRequest, Rating},
    repo,
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    recipes::{repo as recipes, Recipe},
    state::AppState,
};

pub fn rating_routes() -> Router<AppState> {
    Router::new().route("/ratings", get(list_ratings).post(rate_recipe))
}

/// Upserts the caller's vote and answers with the re-aggregated recipe.
#[instrument(skip(state))]
pub async fn rate_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<RateRequest>,
) -> AppResult<Json<Recipe>> {
    let score = validate_score(req.rating).map_err(AppError::BadRequest)?;
    let (average, total) = repo::upsert_and_recompute(&state.db, user_id, req.recipe_id, score)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    info!(recipe_id = %req.recipe_id, %user_id, score, average, total, "rating recorded");

    let recipe = recipes::find(&state.db, req.recipe_id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe not found"))?;
    Ok(Json(recipe))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingQuery {
    pub user_id: Option<Uuid>,
    pub recipe_id: Option<Uuid>,
}

#[instrument(skip(state))]
pub async fn list_ratings(
    State(state): State<AppState>,
    Query(q): Query<RatingQuery>,
) -> AppResult<Json<Vec<Rating>>> {
    Ok(Json(repo::list(&state.db, q.user_id, q.recipe_id).await?))
}
