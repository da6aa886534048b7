//! JWT token minting and decoding
//!
//! Tokens are HMAC-signed JWTs that always carry an expiry. Keys are derived
//! once from a [`TokenConfig`] and shared behind `Arc`, so several codecs
//! (for example one per signing secret during a rotation) can coexist.

use crate::config::JwtConfig;
use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    crypto, decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token id, keeps tokens minted in the same second distinct
    pub jti: String,
}

/// Reasons a presented token is rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,
}

/// Pre-computed JWT keys
#[derive(Clone)]
struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: Arc::new(EncodingKey::from_secret(bytes)),
            decoding: Arc::new(DecodingKey::from_secret(bytes)),
        }
    }
}

/// Codec configuration: signing secret, algorithm and token lifetime
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: SecretString,
    pub algorithm: Algorithm,
    pub ttl: Duration,
}

impl TryFrom<&JwtConfig> for TokenConfig {
    type Error = anyhow::Error;

    fn try_from(config: &JwtConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.algorithm)
            .map_err(|e| anyhow::anyhow!("Unknown signing algorithm {}: {}", config.algorithm, e))?;

        Ok(Self {
            secret: config.secret.clone(),
            algorithm,
            ttl: Duration::seconds(config.access_token_expiry_secs),
        })
    }
}

/// Stateless token codec
///
/// Cloning is cheap: keys are behind `Arc`.
#[derive(Clone)]
pub struct TokenCodec {
    keys: JwtKeys,
    algorithm: Algorithm,
    ttl: Duration,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Build a codec. Only HMAC algorithms and positive lifetimes are accepted.
    pub fn new(config: TokenConfig) -> Result<Self> {
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            anyhow::bail!(
                "Unsupported signing algorithm {:?}: only HS256, HS384 and HS512 are allowed",
                config.algorithm
            );
        }
        if config.ttl <= Duration::zero() {
            anyhow::bail!("Token lifetime must be positive");
        }

        // Expiry is checked against the caller's clock in `decode`, not the system clock.
        let mut validation = Validation::new(config.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            keys: JwtKeys::new(&config.secret),
            algorithm: config.algorithm,
            ttl: config.ttl,
            validation: Arc::new(validation),
        })
    }

    /// Mint a token for `subject` valid for the configured lifetime
    #[inline]
    pub fn mint(&self, subject: &str, now: DateTime<Utc>) -> Result<String> {
        self.mint_with_ttl(subject, now, self.ttl)
    }

    /// Mint a token with an explicit lifetime
    pub fn mint_with_ttl(&self, subject: &str, now: DateTime<Utc>, ttl: Duration) -> Result<String> {
        let exp = now + ttl;

        let claims = Claims {
            sub: subject.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to mint token: {}", e))
    }

    /// Verify `token` and return its subject
    ///
    /// Fails with [`TokenError::Expired`] once `now` reaches the encoded expiry.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.verify(token)?;
        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    /// Expiry of a signature-valid token, whether or not it has elapsed
    pub fn expires_at(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claims = self.verify(token)?;
        Utc.timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TokenError::Malformed)
    }

    /// Configured token lifetime
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Check the MAC over `header.payload` before parsing either segment,
    /// so any edit to a signed token surfaces as a bad signature.
    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (message, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        if message.split('.').count() != 2 {
            return Err(TokenError::Malformed);
        }

        let signed = crypto::verify(
            signature,
            message.as_bytes(),
            &self.keys.decoding,
            self.algorithm,
        )
        .map_err(|_| TokenError::Malformed)?;
        if !signed {
            return Err(TokenError::InvalidSignature);
        }

        decode::<Claims>(token, &self.keys.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })
    }
}
