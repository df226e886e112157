use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    model::{Favorite, FavoriteRequest, ToggleResponse},
    repo,
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    recipes::repo as recipes,
    state::AppState,
};

pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/toggle", post(toggle_favorite))
        .route("/favorites/:recipe_id", delete(remove_favorite))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesQuery {
    pub user_id: Option<Uuid>,
}

#[instrument(skip(state))]
pub async fn list_favorites(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(q): Query<FavoritesQuery>,
) -> AppResult<Json<Vec<Favorite>>> {
    let user_id = q.user_id.unwrap_or(caller);
    Ok(Json(repo::list(&state.db, user_id).await?))
}

async fn ensure_recipe(state: &AppState, recipe_id: Uuid) -> AppResult<()> {
    recipes::find_row(&state.db, recipe_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Recipe not found"))
}

/// 201 on first add, 200 when already a favorite.
#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<FavoriteRequest>,
) -> AppResult<(StatusCode, Json<ToggleResponse>)> {
    ensure_recipe(&state, req.recipe_id).await?;
    let created = repo::add(&state.db, user_id, req.recipe_id).await?;
    let status = if created {
        info!(%user_id, recipe_id = %req.recipe_id, "favorite added");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ToggleResponse {
            recipe_id: req.recipe_id,
            favorited: true,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if repo::remove(&state.db, user_id, recipe_id).await? {
        info!(%user_id, %recipe_id, "favorite removed");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<FavoriteRequest>,
) -> AppResult<Json<ToggleResponse>> {
    ensure_recipe(&state, req.recipe_id).await?;
    let favorited = repo::toggle(&state.db, user_id, req.recipe_id).await?;
    info!(%user_id, recipe_id = %req.recipe_id, favorited, "favorite toggled");
    Ok(Json(ToggleResponse {
        recipe_id: req.recipe_id,
        favorited,
    }))
}
