//! Data services over the shared Postgres pool
//!
//! All list operations take a resolved [`TenantScope`] and apply it as a row
//! filter; a scope that matches nothing short-circuits without touching the
//! pool. The canonical scope key is the country id; devices and loans store
//! a country *code* and reconcile by joining `countries` on it.

use crate::auth::Role;
use crate::error::AppError;
use crate::scope::{CountryDirectory, ScopeFilter, TenantScope};
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;

/// User record. Deliberately not serializable; handlers project it into
/// response types that omit the password hash.
#[derive(Clone, Debug)]
pub struct DbUser {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub country_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct DbCountry {
    pub id: i32,
    pub code: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct DbDevice {
    pub id: i32,
    pub model: String,
    pub serial_no: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct DbLoan {
    pub id: i32,
    pub device_id: i32,
    pub user_id: Option<i32>,
    pub borrower_email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

const USER_COLUMNS: &str = "id, email, password_hash, role, country_id, created_at, updated_at";

fn user_from_row(row: &Row) -> Result<DbUser, AppError> {
    let role: String = row.get("role");
    Ok(DbUser {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role
            .parse()
            .map_err(|e: String| AppError::Internal(format!("Corrupt role column: {}", e)))?,
        country_id: row.get("country_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn device_from_row(row: &Row) -> DbDevice {
    DbDevice {
        id: row.get("id"),
        model: row.get("model"),
        serial_no: row.get("serial_no"),
        country_code: row.get("country_code"),
        created_at: row.get("created_at"),
    }
}

fn is_unique_violation(e: &tokio_postgres::Error) -> bool {
    e.code() == Some(&SqlState::UNIQUE_VIOLATION)
}

/// User storage operations
pub struct UserService {
    pool: Pool,
}

impl UserService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Insert a new user. A concurrent create with the same email loses
    /// deterministically on the unique constraint and surfaces as
    /// [`AppError::DuplicateEmail`].
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
        country_id: Option<i32>,
    ) -> Result<DbUser, AppError> {
        let client = self.pool.get().await?;

        let statement = format!(
            "INSERT INTO users (email, password_hash, role, country_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let row = client
            .query_one(
                statement.as_str(),
                &[&email, &password_hash, &role.as_str(), &country_id],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateEmail
                } else {
                    AppError::Database(e)
                }
            })?;

        user_from_row(&row)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<DbUser>, AppError> {
        let client = self.pool.get().await?;
        let statement = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = client.query_opt(statement.as_str(), &[&email]).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<DbUser>, AppError> {
        let client = self.pool.get().await?;
        let statement = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = client.query_opt(statement.as_str(), &[&id]).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Users visible under `scope`, most recently created first (stable for
    /// admin-view pagination).
    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<DbUser>, AppError> {
        let rows = match scope.filter() {
            ScopeFilter::Nothing => return Ok(Vec::new()),
            ScopeFilter::All => {
                let client = self.pool.get().await?;
                let statement = format!(
                    "SELECT {USER_COLUMNS} FROM users
                     ORDER BY created_at DESC, id DESC"
                );
                client.query(statement.as_str(), &[]).await?
            }
            ScopeFilter::Country(country_id) => {
                let client = self.pool.get().await?;
                let statement = format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE country_id = $1
                     ORDER BY created_at DESC, id DESC"
                );
                client.query(statement.as_str(), &[&country_id]).await?
            }
        };

        rows.iter().map(user_from_row).collect()
    }

    /// Returns false when no such user exists.
    pub async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, AppError> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE users
                 SET password_hash = $1, updated_at = CURRENT_TIMESTAMP
                 WHERE id = $2",
                &[&password_hash, &id],
            )
            .await?;
        Ok(updated > 0)
    }

    pub async fn update_role(&self, id: i32, role: Role) -> Result<Option<DbUser>, AppError> {
        let client = self.pool.get().await?;
        let statement = format!(
            "UPDATE users
             SET role = $1, updated_at = CURRENT_TIMESTAMP
             WHERE id = $2
             RETURNING {USER_COLUMNS}"
        );
        let row = client
            .query_opt(statement.as_str(), &[&role.as_str(), &id])
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM users WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }
}

/// Country (tenant) storage operations
pub struct CountryService {
    pool: Pool,
}

impl CountryService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// All countries, code order. Used to populate tenant selectors.
    pub async fn list(&self) -> Result<Vec<DbCountry>, AppError> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT id, code, name FROM countries ORDER BY code", &[])
            .await?;
        Ok(rows
            .iter()
            .map(|row| DbCountry {
                id: row.get("id"),
                code: row.get("code"),
                name: row.get("name"),
            })
            .collect())
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<DbCountry>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, code, name FROM countries WHERE code = $1",
                &[&code],
            )
            .await?;
        Ok(row.map(|row| DbCountry {
            id: row.get("id"),
            code: row.get("code"),
            name: row.get("name"),
        }))
    }

    pub async fn create(&self, code: &str, name: &str) -> Result<DbCountry, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO countries (code, name) VALUES ($1, $2)
                 RETURNING id, code, name",
                &[&code, &name],
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Country code already exists".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(DbCountry {
            id: row.get("id"),
            code: row.get("code"),
            name: row.get("name"),
        })
    }
}

impl CountryDirectory for CountryService {
    async fn country_id_by_code(&self, code: &str) -> Result<Option<i32>, AppError> {
        Ok(self.find_by_code(code).await?.map(|c| c.id))
    }
}

/// Device storage operations (read-only here; inventory mutation lives in the
/// import tooling outside this service)
pub struct DeviceService {
    pool: Pool,
}

impl DeviceService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Devices visible under `scope`, id order. Devices carry a country code,
    /// so the id-keyed scope filter goes through the countries table.
    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<DbDevice>, AppError> {
        let rows = match scope.filter() {
            ScopeFilter::Nothing => return Ok(Vec::new()),
            ScopeFilter::All => {
                let client = self.pool.get().await?;
                client
                    .query(
                        "SELECT id, model, serial_no, country_code, created_at
                         FROM devices ORDER BY id",
                        &[],
                    )
                    .await?
            }
            ScopeFilter::Country(country_id) => {
                let client = self.pool.get().await?;
                client
                    .query(
                        "SELECT d.id, d.model, d.serial_no, d.country_code, d.created_at
                         FROM devices d
                         JOIN countries c ON c.code = d.country_code
                         WHERE c.id = $1
                         ORDER BY d.id",
                        &[&country_id],
                    )
                    .await?
            }
        };

        Ok(rows.iter().map(device_from_row).collect())
    }
}

/// Loan storage operations (read-only here)
pub struct LoanService {
    pool: Pool,
}

impl LoanService {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Loans visible under `scope`, id order. Loans have no country of their
    /// own; they inherit their device's, through the same code-to-id join.
    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<DbLoan>, AppError> {
        let rows = match scope.filter() {
            ScopeFilter::Nothing => return Ok(Vec::new()),
            ScopeFilter::All => {
                let client = self.pool.get().await?;
                client
                    .query(
                        "SELECT id, device_id, user_id, borrower_email, issued_at, returned_at
                         FROM loans ORDER BY id",
                        &[],
                    )
                    .await?
            }
            ScopeFilter::Country(country_id) => {
                let client = self.pool.get().await?;
                client
                    .query(
                        "SELECT l.id, l.device_id, l.user_id, l.borrower_email,
                                l.issued_at, l.returned_at
                         FROM loans l
                         JOIN devices d ON d.id = l.device_id
                         JOIN countries c ON c.code = d.country_code
                         WHERE c.id = $1
                         ORDER BY l.id",
                        &[&country_id],
                    )
                    .await?
            }
        };

        Ok(rows
            .iter()
            .map(|row| DbLoan {
                id: row.get("id"),
                device_id: row.get("device_id"),
                user_id: row.get("user_id"),
                borrower_email: row.get("borrower_email"),
                issued_at: row.get("issued_at"),
                returned_at: row.get("returned_at"),
            })
            .collect())
    }
}
