//! Authentication module
//!
//! Provides JWT-based bearer tokens, argon2 password hashing and the
//! revocation interceptor that guards every request.

mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, TokenCodec, TokenConfig, TokenError};
pub use middleware::{bearer_token, revocation_guard, AuthUser, BearerToken};
pub use password::PasswordService;
