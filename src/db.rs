//! Database schema bootstrap and data services
//!
//! Creates the schema on startup (idempotent), seeds reference data, and
//! ensures the bootstrap SUPERADMIN account. The services themselves live in
//! [`service`].

mod service;

pub use service::{
    CountryService, DbCountry, DbDevice, DbLoan, DbUser, DeviceService, LoanService, UserService,
};

use crate::auth::{hash_password, Role};
use crate::config::BootstrapConfig;
use deadpool_postgres::Pool;
use tracing::{info, warn};

/// Countries seeded on first run so a fresh deployment has tenants to assign.
const SEED_COUNTRIES: &[(&str, &str)] = &[
    ("HR", "Croatia"),
    ("SI", "Slovenia"),
    ("RS", "Serbia"),
    ("BA", "Bosnia and Herzegovina"),
    ("ME", "Montenegro"),
    ("MK", "North Macedonia"),
];

/// Create tables and indexes if they don't exist and seed reference data.
pub async fn init_schema(pool: &Pool) -> anyhow::Result<()> {
    let client = pool.get().await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS countries (
                id SERIAL PRIMARY KEY,
                code VARCHAR(8) UNIQUE NOT NULL,
                name VARCHAR(128) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS users (
                id SERIAL PRIMARY KEY,
                email VARCHAR(255) UNIQUE NOT NULL,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(32) NOT NULL,
                country_id INTEGER REFERENCES countries(id),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS devices (
                id SERIAL PRIMARY KEY,
                model VARCHAR(255) NOT NULL,
                serial_no VARCHAR(64) UNIQUE NOT NULL,
                country_code VARCHAR(8) NOT NULL REFERENCES countries(code),
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            &[],
        )
        .await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS loans (
                id SERIAL PRIMARY KEY,
                device_id INTEGER NOT NULL REFERENCES devices(id) ON DELETE CASCADE,
                user_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                borrower_email VARCHAR(255),
                issued_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
                returned_at TIMESTAMPTZ
            )",
            &[],
        )
        .await?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_users_country_id ON users(country_id)",
        "CREATE INDEX IF NOT EXISTS idx_devices_country_code ON devices(country_code)",
        "CREATE INDEX IF NOT EXISTS idx_loans_device_id ON loans(device_id)",
    ] {
        client.execute(statement, &[]).await?;
    }

    for (code, name) in SEED_COUNTRIES {
        client
            .execute(
                "INSERT INTO countries (code, name) VALUES ($1, $2)
                 ON CONFLICT (code) DO NOTHING",
                &[code, name],
            )
            .await?;
    }

    info!("Database schema initialized");
    Ok(())
}

/// Ensure the configured bootstrap SUPERADMIN account exists.
///
/// Skipped with a warning when credentials are not configured; an already
/// existing account is left untouched.
pub async fn ensure_bootstrap_admin(
    users: &UserService,
    bootstrap: &BootstrapConfig,
) -> anyhow::Result<()> {
    let (email, password) = match (&bootstrap.admin_email, &bootstrap.admin_password) {
        (Some(email), Some(password)) => (email, password),
        _ => {
            warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping bootstrap superadmin");
            return Ok(());
        }
    };

    if users.find_by_email(email).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(password)?;
    users
        .create(email, &password_hash, Role::Superadmin, None)
        .await?;
    info!(email, "Bootstrap superadmin created");
    Ok(())
}
