use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use super::local::{keys, LocalStore};

/// Why a call produced no data.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("You must be logged in")]
    NotLoggedIn,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("local state: {0}")]
    Local(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }
}

/// `Ok` carries the data, `Err` the reason the call failed.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// JSON-over-HTTP client that signs requests with the persisted token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: LocalStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: LocalStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn token(&self) -> Option<String> {
        self.store.get::<String>(keys::TOKEN).ok().flatten()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Sends the request; non-2xx answers become [`ApiError::Server`].
    /// A 401 also drops the persisted token and user.
    async fn send(&self, req: RequestBuilder) -> ApiResult<Response> {
        let res = req.send().await.map_err(|e| {
            warn!(error = %e, "request failed");
            ApiError::Transport(e)
        })?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.forget_session();
        }
        let message = match res.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        warn!(status = status.as_u16(), %message, "request rejected");
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    fn forget_session(&self) {
        for key in [keys::TOKEN, keys::REFRESH_TOKEN, keys::USER] {
            if let Err(e) = self.store.remove(key) {
                error!(error = %e, key, "failed to clear session");
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let res = self.send(self.request(Method::GET, path)).await?;
        Ok(res.json().await?)
    }

    pub async fn get_with<Q, T>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self.send(self.request(Method::GET, path).query(query)).await?;
        Ok(res.json().await?)
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self.send(self.request(method, path).json(body)).await?;
        Ok(res.json().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }
}
