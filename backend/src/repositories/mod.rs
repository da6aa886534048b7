//! Database repositories
//!
//! The auth core talks to storage through two narrow contracts,
//! [`CredentialStore`] and [`RevocationLedger`]. PostgreSQL implementations
//! back production; in-memory ones back tests and local runs.

pub mod memory;
pub mod revocation;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use translation_service_shared::UserView;

pub use memory::{MemoryCredentialStore, MemoryRevocationLedger};
pub use revocation::PgRevocationRepository;
pub use user::PgUserRepository;

/// Stored credential
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Public view without the password digest
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("record already exists")]
    Conflict,

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Username → salted password digest
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a credential. Fails with [`StoreError::Conflict`] if the username is taken.
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<CredentialRecord>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<CredentialRecord>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<CredentialRecord>>;

    /// Check the backing store is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Durable set of revoked token strings
#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Record `token` as revoked. Revoking an already revoked token is a no-op.
    ///
    /// `expires_at` is when the entry may be purged.
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    async fn is_revoked(&self, token: &str) -> StoreResult<bool>;

    /// Drop entries whose `expires_at <= now`, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}
