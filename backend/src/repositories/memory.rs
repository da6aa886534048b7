//! In-memory stores
//!
//! Same contracts as the PostgreSQL repositories, held in process memory.
//! Each operation runs under a single lock, so check-and-insert is atomic
//! the way the unique index makes it atomic in PostgreSQL.

use super::{CredentialRecord, CredentialStore, RevocationLedger, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Users {
    next_id: i64,
    by_username: HashMap<String, CredentialRecord>,
}

/// In-memory credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<Users>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, as an administrative path would
    pub async fn remove(&self, username: &str) -> bool {
        self.users.lock().await.by_username.remove(username).is_some()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<CredentialRecord> {
        let mut users = self.users.lock().await;
        if users.by_username.contains_key(username) {
            return Err(StoreError::Conflict);
        }

        users.next_id += 1;
        let record = CredentialRecord {
            id: users.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users
            .by_username
            .insert(username.to_string(), record.clone());

        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<CredentialRecord>> {
        Ok(self.users.lock().await.by_username.get(username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<CredentialRecord>> {
        Ok(self
            .users
            .lock()
            .await
            .by_username
            .values()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// In-memory revocation ledger
#[derive(Default)]
pub struct MemoryRevocationLedger {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryRevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl RevocationLedger for MemoryRevocationLedger {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        self.entries
            .lock()
            .await
            .entry(token.to_string())
            .or_insert(expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> StoreResult<bool> {
        Ok(self.entries.lock().await.contains_key(token))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}
