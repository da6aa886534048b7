//! Authentication middleware
//!
//! Two layers of enforcement:
//! - [`revocation_guard`] runs on every request and turns away revoked
//!   tokens before any handler runs.
//! - [`AuthUser`] resolves the full identity for routes that need one.

use crate::error::ApiError;
use crate::services::Identity;
use crate::state::AppState;
use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// Returns `None` when the header is absent, not UTF-8, uses another scheme
/// or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Boundary interceptor: short-circuit requests carrying a revoked token
///
/// Requests without a usable bearer token pass through untouched; whether
/// they are allowed is decided per route. Failures are returned as a
/// response rather than propagated.
pub async fn revocation_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).map(str::to_owned);

    if let Some(token) = token {
        match state.auth().is_revoked(&token).await {
            Ok(true) => {
                metrics::counter!("auth_revoked_rejections_total").increment(1);
                warn!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    "Rejected request with revoked token"
                );
                return ApiError::TokenRevoked.into_response();
            }
            Ok(false) => {}
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    next.run(request).await
}

/// Raw bearer token, not validated
///
/// Used where a syntactically present token is enough, such as logout.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Err(ApiError::Unauthorized(
                "Missing authorization header".to_string(),
            ));
        }

        bearer_token(&parts.headers)
            .map(|token| BearerToken(token.to_string()))
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))
    }
}

/// Authenticated user resolved from the bearer token
///
/// Decodes the token, checks revocation and loads the user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;

        let identity = app_state.auth().resolve_current_user(&token).await?;

        Ok(AuthUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[rstest]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("Bearer")]
    #[case("Bearer ")]
    #[case("bearer abc")]
    #[case("abc.def.ghi")]
    fn test_unusable_headers_yield_none(#[case] value: &str) {
        assert_eq!(bearer_token(&headers_with(value)), None);
    }

    #[test]
    fn test_auth_user_debug() {
        let user = AuthUser(Identity {
            id: 1,
            username: "alice".to_string(),
        });
        let debug_str = format!("{:?}", user);
        assert!(debug_str.contains("AuthUser"));
    }
}
