//! Auth service: registration, login, logout and identity resolution
//!
//! Valid tokens are stateless; the only per-token state is the revocation
//! ledger. Every check re-queries the stores, nothing is cached in process.
//!
//! # Performance Optimizations
//!
//! - Password hashing/verification runs on blocking thread pool
//! - Token codec keys are pre-computed and shared via `Arc`

use crate::auth::{PasswordService, TokenCodec, TokenError};
use crate::repositories::{CredentialStore, RevocationLedger, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use translation_service_shared::{
    validate_password, validate_username, TokenResponse, UserView, BEARER_TOKEN_TYPE,
};

/// Authenticated principal resolved from a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
}

impl Identity {
    /// Fail with [`AuthError::Unauthorized`] unless this identity owns the resource
    pub fn ensure_owns(&self, owner_id: i64) -> Result<(), AuthError> {
        if self.id == owner_id {
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }
}

impl From<Identity> for UserView {
    fn from(identity: Identity) -> Self {
        UserView {
            id: identity.id,
            username: identity.username,
        }
    }
}

/// Auth failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already registered")]
    DuplicateUser,

    /// Unknown username and wrong password are deliberately the same error
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Token has been revoked")]
    Revoked,

    #[error("User not found")]
    UserNotFound,

    #[error("Not authorized to access this resource")]
    Unauthorized,

    #[error("Storage error")]
    Storage(#[source] StoreError),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Token decode failures and revocation collapse to one outcome at the API boundary
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AuthError::InvalidToken(_) | AuthError::Revoked)
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Storage(err)
    }
}

/// Auth service
///
/// Cloning is cheap: stores are behind `Arc`, codec keys are pre-computed.
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationLedger>,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationLedger>,
        tokens: TokenCodec,
    ) -> Self {
        Self {
            credentials,
            revocations,
            tokens,
        }
    }

    /// Register a new user
    ///
    /// At most one of several concurrent registrations for the same username
    /// succeeds; the store's uniqueness constraint decides.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserView, AuthError> {
        validate_username(username).map_err(AuthError::Validation)?;
        validate_password(password).map_err(AuthError::Validation)?;

        if self.credentials.find_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateUser);
        }

        let password_hash = PasswordService::hash_async(password.to_string()).await?;

        let user = self
            .credentials
            .create(username, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Conflict => AuthError::DuplicateUser,
                other => AuthError::Storage(other),
            })?;

        metrics::counter!("auth_register_total").increment(1);
        info!(user_id = user.id, username = %user.username, "User registered");

        Ok(user.view())
    }

    /// Check credentials and mint an access token
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, AuthError> {
        let user = self.credentials.find_by_username(username).await?;

        let user = match user {
            Some(user) => {
                let valid =
                    PasswordService::verify_async(password.to_string(), user.password_hash.clone())
                        .await;
                valid.then_some(user)
            }
            None => {
                PasswordService::verify_dummy_async(password.to_string()).await;
                None
            }
        };

        let Some(user) = user else {
            metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
            return Err(AuthError::InvalidCredentials);
        };

        let access_token = self.tokens.mint(&user.username, Utc::now())?;

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        info!(user_id = user.id, username = %user.username, "User logged in");

        Ok(TokenResponse {
            access_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            expires_in: self.tokens.ttl().num_seconds(),
        })
    }

    /// Revoke `token` whatever its current validity
    ///
    /// The ledger entry is retained until the token's own expiry, or for one
    /// full token lifetime when the expiry cannot be read.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let now = Utc::now();
        let expires_at = self
            .tokens
            .expires_at(token)
            .unwrap_or_else(|_| now + self.tokens.ttl());

        self.revocations.revoke(token, expires_at).await?;

        metrics::counter!("auth_logout_total").increment(1);
        debug!(%expires_at, "Token revoked");

        Ok(())
    }

    /// Resolve the identity behind a presented token
    ///
    /// This is the gate every protected route goes through.
    pub async fn resolve_current_user(&self, token: &str) -> Result<Identity, AuthError> {
        let username = self.tokens.decode(token, Utc::now())?;

        if self.revocations.is_revoked(token).await? {
            return Err(AuthError::Revoked);
        }

        let user = self
            .credentials
            .find_by_username(&username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(Identity {
            id: user.id,
            username: user.username,
        })
    }

    /// Look up a user's public view by id
    pub async fn find_user(&self, id: i64) -> Result<UserView, AuthError> {
        self.credentials
            .find_by_id(id)
            .await?
            .map(|user| user.view())
            .ok_or(AuthError::UserNotFound)
    }

    /// Revocation membership test, used by the boundary interceptor
    pub async fn is_revoked(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self.revocations.is_revoked(token).await?)
    }

    /// Drop revocation entries whose tokens have expired by `now`
    pub async fn purge_revoked(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let purged = self.revocations.purge_expired(now).await?;
        if purged > 0 {
            metrics::counter!("auth_revocations_purged_total").increment(purged);
        }
        Ok(purged)
    }

    /// Check the credential store is reachable
    pub async fn ping(&self) -> Result<(), AuthError> {
        Ok(self.credentials.ping().await?)
    }

    /// The token codec in use
    #[inline]
    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }
}
