//! Translation Service Backend
//!
//! User registration, login and bearer-token session management for the
//! translation task API.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling, with a revocation guard in front of every route
//! - Services: Token lifecycle and credential checks
//! - Repositories: Credential store and revocation ledger (PostgreSQL or in-memory)

use anyhow::Result;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusBuilder;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use translation_service_backend::{config, db, routes, services::AuthService, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Translation Service Backend"
    );

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let purge_interval_secs = config.revocation.purge_interval_secs;

    // Create application state
    let state = if config.database.is_in_memory() {
        warn!("Using in-memory stores; registrations and revocations are lost on restart");
        AppState::in_memory(config)?
    } else {
        info!("Connecting to database...");
        let db_pool =
            db::create_pool(&config.database.url, config.database.max_connections).await?;

        // Run migrations (skip in production if using separate migration job)
        if !config::AppConfig::is_production() {
            db::run_migrations(&db_pool).await?;
        }

        AppState::postgres(db_pool, config)?
    };

    // Install metrics recorder (optional - the service runs without it)
    let state = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state.with_metrics(handle),
        Err(e) => {
            warn!("Failed to install metrics recorder: {}. Metrics will be disabled.", e);
            state
        }
    };

    spawn_revocation_purge(state.auth().clone(), purge_interval_secs);

    // Build application
    let app = routes::create_router(state);

    // Start server
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop revocation entries for tokens that have expired anyway
fn spawn_revocation_purge(auth: AuthService, interval_secs: u64) {
    if interval_secs == 0 {
        info!("Revocation purge disabled");
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            match auth.purge_revoked(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Purged expired revocation entries"),
                Err(e) => warn!("Revocation purge failed: {}", e),
            }
        }
    });
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "translation_service_backend=info,tower_http=info".into()
        } else {
            "translation_service_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Check JWT secret is not default
    let secret = config.jwt.secret.expose_secret();
    if secret.contains("development") || secret.len() < 32 {
        errors.push("JWT secret must be at least 32 characters and not contain 'development'");
    }

    if config.database.is_in_memory() {
        errors.push("In-memory stores are not durable and cannot be used in production");
    }

    // Check database URL is not localhost in production
    if config.database.url.contains("localhost") || config.database.url.contains("127.0.0.1") {
        warn!("Database URL contains localhost - ensure this is intentional for production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
