//! Authentication routes
//!
//! Provides endpoints for registration, login, logout and the current identity.
//!
//! # Performance Optimizations
//!
//! - Uses pre-computed JWT keys from AppState (no per-request allocation)
//! - Password hashing runs on blocking thread pool (doesn't block async runtime)

use crate::auth::{AuthUser, BearerToken};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use translation_service_shared::{
    LoginRequest, LogoutResponse, RegisterRequest, TokenResponse, UserView,
};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(current_user))
}

/// Register a new user
///
/// POST /register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<UserView>> {
    let user = state.auth().register(&req.username, &req.password).await?;
    Ok(Json(user))
}

/// Login with username and password
///
/// POST /login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let tokens = state.auth().login(&req.username, &req.password).await?;
    Ok(Json(tokens))
}

/// Revoke the presented token
///
/// POST /logout
///
/// # Authentication
/// Requires a Bearer token in the Authorization header. The token only has
/// to be present; expired or otherwise invalid tokens are revoked too.
async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<LogoutResponse>> {
    state.auth().logout(&token).await?;
    Ok(Json(LogoutResponse::success()))
}

/// Get the current identity (requires authentication)
///
/// GET /me
async fn current_user(AuthUser(identity): AuthUser) -> Json<UserView> {
    Json(identity.into())
}
