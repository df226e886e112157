//! SDK for the recipe API: typed calls, a persisted session, and the
//! client-side recipe and ingredient state.

pub mod api;
pub mod autocomplete;
pub mod http;
pub mod local;
pub mod recipes;
pub mod session;

pub use autocomplete::{IngredientSuggestion, IngredientUsage};
pub use http::{ApiClient, ApiError, ApiResult};
pub use local::{keys, LocalStore};
pub use recipes::RecipeStore;
pub use session::AuthSession;

use crate::config::ClientConfig;

/// Client, session and recipe state wired to one server and state directory.
pub fn connect(config: &ClientConfig) -> anyhow::Result<(AuthSession, RecipeStore)> {
    let store = LocalStore::open(&config.state_dir)?;
    let api = ApiClient::new(&config.base_url, store);
    let mut session = AuthSession::new(api.clone());
    session.restore();
    Ok((session, RecipeStore::new(api)))
}
