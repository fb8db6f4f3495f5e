//! LoanDesk API - Device Loan & Lead Tracking Administration Backend
//!
//! Multi-country administration service for "Try & Buy" style device-loan
//! programs: JWT-authenticated, role-scoped REST endpoints over a shared
//! Postgres store, with per-request tenant (country) scoping.

mod auth;
mod config;
mod db;
mod error;
mod routes;
mod scope;
mod state;

use crate::config::{DatabaseConfig, Settings};
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting LoanDesk API...");

    let settings = Settings::load()?;
    info!("Configuration loaded");

    if std::env::var("JWT_SECRET").is_err() {
        warn!("JWT_SECRET not set, using default (INSECURE - set in production!)");
    }

    let pool = init_database_pool(&settings.database).await?;
    info!("Database pool created");

    db::init_schema(&pool).await?;

    let state = Arc::new(AppState::new(pool));
    db::ensure_bootstrap_admin(&state.users, &settings.bootstrap).await?;

    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    info!("Server listening on http://{}", addr);
    info!("API endpoints:");
    info!("   POST   /api/auth/login                    - Login with email/password");
    info!("   GET    /api/auth/me                       - Current identity");
    info!("   GET    /api/admin/users?country=CODE      - List users in scope");
    info!("   POST   /api/admin/users                   - Create user");
    info!("   PATCH  /api/admin/users/{{id}}/password     - Change password");
    info!("   PATCH  /api/admin/users/{{id}}/role         - Change role (superadmin)");
    info!("   DELETE /api/admin/users/{{id}}              - Delete user");
    info!("   GET    /api/admin/countries               - List countries");
    info!("   POST   /api/admin/countries               - Add country (superadmin)");
    info!("   GET    /api/admin/devices?country=CODE    - List devices in scope");
    info!("   GET    /api/admin/loans?country=CODE      - List loans in scope");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,loandesk_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .init();
}

/// Build the process-wide connection pool.
///
/// TLS is negotiated when the configuration demands it (managed Postgres
/// hosts typically do).
async fn init_database_pool(config: &DatabaseConfig) -> anyhow::Result<deadpool_postgres::Pool> {
    use deadpool_postgres::{Config, ManagerConfig, PoolConfig, RecyclingMethod, Runtime};

    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.pool = Some(PoolConfig::new(config.max_pool_size));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = if config.require_tls {
        let certs = rustls_native_certs::load_native_certs();
        let mut root_store = rustls::RootCertStore::empty();
        for cert in certs.certs {
            root_store.add(cert).ok();
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

        cfg.create_pool(Some(Runtime::Tokio1), tls)
            .map_err(|e| anyhow::anyhow!("Failed to create TLS pool: {}", e))?
    } else {
        cfg.create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls)
            .map_err(|e| anyhow::anyhow!("Failed to create pool: {}", e))?
    };

    // Verify the pool actually reaches the server before serving traffic
    let client = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get pool connection: {}", e))?;
    client
        .query_one("SELECT 1 as ok", &[])
        .await
        .map_err(|e| anyhow::anyhow!("Failed to verify database connection: {}", e))?;

    info!("Database connection verified (TLS: {})", config.require_tls);
    Ok(pool)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
