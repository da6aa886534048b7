//! Password hashing using argon2
//!
//! New digests are Argon2id PHC strings with an embedded random salt.
//! Legacy bcrypt digests from earlier deployments still verify.
//!
//! # Performance Considerations
//!
//! Both algorithms are intentionally CPU-intensive. Async callers should use
//! the `*_async` variants, which run on the blocking thread pool.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use tracing::error;

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// Digest verified against when the username is unknown, so both login
/// failure paths cost the same.
static DUMMY_DIGEST: Lazy<Option<String>> =
    Lazy::new(|| PasswordService::hash("placeholder-password-never-matches").ok());

/// Password hashing service
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using argon2 (blocking operation)
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a stored digest (blocking operation)
    ///
    /// A malformed digest is a non-match, never an error.
    pub fn verify(password: &str, digest: &str) -> bool {
        if BCRYPT_PREFIXES.iter().any(|prefix| digest.starts_with(prefix)) {
            return bcrypt::verify(password, digest).unwrap_or(false);
        }

        let Ok(parsed_hash) = PasswordHash::new(digest) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(password: String, digest: String) -> bool {
        match tokio::task::spawn_blocking(move || Self::verify(&password, &digest)).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// Burn the same CPU as a real verification, always failing
    pub async fn verify_dummy_async(password: String) -> bool {
        match DUMMY_DIGEST.as_ref() {
            Some(digest) => {
                Self::verify_async(password, digest.clone()).await;
                false
            }
            None => false,
        }
    }
}
