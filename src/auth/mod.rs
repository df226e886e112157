use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;

pub use dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
pub use jwt::{AuthUser, JwtKeys};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
