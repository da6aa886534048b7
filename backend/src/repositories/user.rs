//! User repository for database operations

use super::{CredentialRecord, CredentialStore, StoreError, StoreResult};
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgUserRepository {
    async fn create(&self, username: &str, password_hash: &str) -> StoreResult<CredentialRecord> {
        sqlx::query_as::<_, CredentialRecord>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // Concurrent registrations race here; the unique index decides.
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Database(e),
        })
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<CredentialRecord>> {
        let user = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<CredentialRecord>> {
        let user = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
