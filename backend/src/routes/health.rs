//! Health endpoints
//!
//! `/health` and `/health/live` answer as long as the process serves
//! requests. `/health/ready` also pings the credential store and reports
//! which backend holds it.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

impl HealthResponse {
    fn bare(status: &'static str) -> Self {
        Self {
            status,
            version: VERSION,
            checks: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub credential_store: StoreCheck,
}

/// Where credentials and revocations live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn of(state: &AppState) -> Self {
        if state.config().database.is_in_memory() {
            Self::Memory
        } else {
            Self::Postgres
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoreCheck {
    pub healthy: bool,
    pub backend: StoreBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::bare("healthy"))
}

/// 503 while the credential store is unreachable
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let error = state.auth().ping().await.err().map(|e| e.to_string());
    let check = StoreCheck {
        healthy: error.is_none(),
        backend: StoreBackend::of(&state),
        error,
    };

    let (code, status) = if check.healthy {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: VERSION,
            checks: Some(HealthChecks {
                credential_store: check,
            }),
        }),
    )
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse::bare("alive"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, MEMORY_DATABASE_URL};
    use crate::repositories::{
        CredentialRecord, CredentialStore, MemoryRevocationLedger, StoreError, StoreResult,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    struct UnreachableStore;

    #[async_trait]
    impl CredentialStore for UnreachableStore {
        async fn create(&self, _: &str, _: &str) -> StoreResult<CredentialRecord> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_username(&self, _: &str) -> StoreResult<Option<CredentialRecord>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_id(&self, _: i64) -> StoreResult<Option<CredentialRecord>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
        assert!(response.checks.is_none());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let Json(response) = liveness_check().await;
        assert_eq!(response.status, "alive");
    }

    #[tokio::test]
    async fn test_readiness_reports_memory_backend() {
        let mut config = AppConfig::default();
        config.database.url = MEMORY_DATABASE_URL.to_string();
        let state = AppState::in_memory(config).unwrap();

        let (code, Json(response)) = readiness_check(State(state)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(response.status, "ready");

        let check = response.checks.unwrap().credential_store;
        assert!(check.healthy);
        assert_eq!(check.backend, StoreBackend::Memory);
        assert!(check.error.is_none());
    }

    #[tokio::test]
    async fn test_readiness_fails_when_store_unreachable() {
        let state = AppState::new(
            Arc::new(UnreachableStore),
            Arc::new(MemoryRevocationLedger::new()),
            AppConfig::default(),
        )
        .unwrap();

        let (code, Json(response)) = readiness_check(State(state)).await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status, "not_ready");

        let check = response.checks.unwrap().credential_store;
        assert!(!check.healthy);
        assert_eq!(check.backend, StoreBackend::Postgres);
        assert!(check.error.is_some());
    }

    #[test]
    fn test_backend_serializes_lowercase() {
        let check = StoreCheck {
            healthy: true,
            backend: StoreBackend::Postgres,
            error: None,
        };
        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(value["backend"], "postgres");
        assert!(value.get("error").is_none());
    }
}
