use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    claims::TokenKind,
    dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
    jwt::{AuthUser, JwtKeys},
    password::{check_strength, hash_password, verify_password},
};
use crate::{
    error::{is_unique_violation, AppError, AppResult},
    state::AppState,
    users::{model::validate_name, repo::NewUser, PublicUser, User, DEFAULT_AVATAR},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// A concurrent signup can still lose the race on `users.email UNIQUE`.
fn registration_failed(email: &str, e: anyhow::Error) -> AppError {
    if is_unique_violation(&e) {
        warn!(%email, "email registered concurrently");
        return AppError::Conflict("User already exists".into());
    }
    AppError::Internal(e)
}

fn issue(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let pair = JwtKeys::from_ref(state).issue_pair(user.id)?;
    Ok(AuthResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }
    check_strength(&payload.password).map_err(|msg| {
        warn!("password too short");
        AppError::BadRequest(msg)
    })?;
    let name = validate_name(&payload.name).map_err(AppError::BadRequest)?;

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let avatar = payload
        .avatar
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_AVATAR);
    let bio = payload.bio.as_deref().map(str::trim).unwrap_or_default();
    let prefs = payload.dietary_preferences.unwrap_or_default();

    let user = User::create(
        &state.db,
        NewUser {
            email: &email,
            password_hash: &hash,
            name: &name,
            avatar,
            bio,
            dietary_preferences: &prefs,
        },
    )
    .await
    .map_err(|e| registration_failed(&email, e))?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();
    let rejected = || AppError::bad_request("Cannot find user");

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(rejected());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(rejected());
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = JwtKeys::from_ref(&state)
        .verify_kind(&payload.refresh_token, TokenKind::Refresh)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue(&state, user)?))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}
