use tracing::{error, info};

use super::{
    http::{ApiClient, ApiError, ApiResult},
    local::keys,
};
use crate::{
    auth::{AuthResponse, RegisterRequest},
    users::{ProfilePatch, PublicUser},
};

/// Who is logged in, backed by the persisted token and user.
#[derive(Debug, Clone)]
pub struct AuthSession {
    api: ApiClient,
    user: Option<PublicUser>,
}

impl AuthSession {
    pub fn new(api: ApiClient) -> Self {
        Self { api, user: None }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    /// Logged in while both a user and a stored token exist; a 401 elsewhere
    /// removes the token.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.api.token().is_some()
    }

    /// Picks up a previous session. Unreadable user data clears it.
    pub fn restore(&mut self) -> Option<&PublicUser> {
        let store = self.api.store();
        let token = store.get::<String>(keys::TOKEN);
        let user = store.get::<PublicUser>(keys::USER);
        self.user = match (token, user) {
            (Ok(Some(_)), Ok(Some(user))) => Some(user),
            (_, Err(e)) => {
                error!(error = %e, "stored user is corrupt; clearing session");
                self.clear();
                None
            }
            _ => None,
        };
        self.user.as_ref()
    }

    fn persist(&mut self, auth: AuthResponse) -> ApiResult<PublicUser> {
        let store = self.api.store();
        store.set(keys::TOKEN, &auth.access_token)?;
        store.set(keys::REFRESH_TOKEN, &auth.refresh_token)?;
        store.set(keys::USER, &auth.user)?;
        self.user = Some(auth.user.clone());
        Ok(auth.user)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ApiResult<PublicUser> {
        let auth = self.api.auth().login(email, password).await?;
        info!(user_id = %auth.user.id, "logged in");
        self.persist(auth)
    }

    pub async fn register(&mut self, req: &RegisterRequest) -> ApiResult<PublicUser> {
        let auth = self.api.auth().register(req).await?;
        info!(user_id = %auth.user.id, "registered");
        self.persist(auth)
    }

    pub fn logout(&mut self) {
        self.clear();
        self.user = None;
    }

    fn clear(&self) {
        let store = self.api.store();
        for key in [keys::TOKEN, keys::REFRESH_TOKEN, keys::USER] {
            if let Err(e) = store.remove(key) {
                error!(error = %e, key, "failed to clear session");
            }
        }
    }

    /// Saves the change on the server and keeps the server's copy of the user.
    pub async fn update_profile(&mut self, patch: ProfilePatch) -> ApiResult<PublicUser> {
        let user_id = self.user.as_ref().ok_or(ApiError::NotLoggedIn)?.id;
        let saved = self.api.auth().update_profile(user_id, &patch).await?;
        self.api.store().set(keys::USER, &saved)?;
        self.user = Some(saved.clone());
        Ok(saved)
    }
}
