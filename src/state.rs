//! Application state management
//!
//! Shared, read-only-after-init state handed to every handler. Services own
//! clones of the one process-wide connection pool and are injected rather
//! than reached for as globals, so each can be exercised against a test pool.

use crate::db::{CountryService, DeviceService, LoanService, UserService};
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    pub db_pool: Pool,
    pub users: UserService,
    pub countries: CountryService,
    pub devices: DeviceService,
    pub loans: LoanService,
}

impl AppState {
    pub fn new(pool: Pool) -> Self {
        Self {
            users: UserService::new(pool.clone()),
            countries: CountryService::new(pool.clone()),
            devices: DeviceService::new(pool.clone()),
            loans: LoanService::new(pool.clone()),
            db_pool: pool,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
