use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::model::{ProfilePatch, PublicUser, User};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user).patch(update_user).put(update_user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, patch))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProfilePatch>,
) -> AppResult<Json<PublicUser>> {
    if caller != id {
        warn!(%caller, target = %id, "profile update for another user");
        return Err(AppError::forbidden("You can only update your own profile"));
    }
    let patch = patch.normalized().map_err(AppError::BadRequest)?;
    let user = User::update_profile(&state.db, id, &patch)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(user_id = %id, "profile updated");
    Ok(Json(user.into()))
}
