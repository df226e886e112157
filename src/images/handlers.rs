use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::{error, instrument};

use super::service;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn image_routes() -> Router<AppState> {
    Router::new().route("/images/*key", get(get_image))
}

/// 307 to a short-lived presigned url of the stored object.
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Response> {
    let Some(storage) = state.storage.as_deref() else {
        return Err(AppError::not_found("Image storage is not configured"));
    };
    let url = service::presign(storage, &key).await.map_err(|e| {
        error!(error = %e, %key, "presign failed");
        AppError::Internal(e)
    })?;
    Ok(Redirect::temporary(&url).into_response())
}
