use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    model::{validate_content, Comment, NewComment},
    repo,
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    recipes::repo as recipes,
    state::AppState,
    users::User,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route("/comments/:id", delete(delete_comment))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub recipe_id: Uuid,
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(q): Query<CommentsQuery>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(repo::list_by_recipe(&state.db, q.recipe_id).await?))
}

#[instrument(skip(state, body))]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let content = validate_content(&body.content).map_err(AppError::BadRequest)?;
    if recipes::find_row(&state.db, body.recipe_id).await?.is_none() {
        return Err(AppError::not_found("Recipe not found"));
    }
    let author = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

    let comment = repo::insert(
        &state.db,
        body.recipe_id,
        user_id,
        &author.name,
        &author.avatar,
        &content,
    )
    .await?;
    info!(comment_id = %comment.id, recipe_id = %body.recipe_id, "comment added");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// The comment's author or the recipe's owner may delete it.
#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let comment = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    let recipe_owner = recipes::find_row(&state.db, comment.recipe_id)
        .await?
        .map(|r| r.author_id);
    if comment.user_id != caller && recipe_owner != Some(caller) {
        warn!(%caller, comment_id = %id, "comment delete refused");
        return Err(AppError::forbidden("You cannot delete this comment"));
    }

    repo::delete(&state.db, id).await?;
    info!(comment_id = %id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
