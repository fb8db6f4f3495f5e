//! Loan route handlers
//!
//! Loans carry no country of their own; visibility follows the loaned
//! device's country through the shared tenant scope.

use crate::auth::Identity;
use crate::db::DbLoan;
use crate::error::AppError;
use crate::scope::{country_override, resolve_tenant_scope};
use crate::state::SharedState;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub id: i32,
    pub device_id: i32,
    pub user_id: Option<i32>,
    pub borrower_email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl From<DbLoan> for LoanResponse {
    fn from(loan: DbLoan) -> Self {
        Self {
            id: loan.id,
            device_id: loan.device_id,
            user_id: loan.user_id,
            borrower_email: loan.borrower_email,
            issued_at: loan.issued_at,
            returned_at: loan.returned_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoansListResponse {
    pub success: bool,
    pub loans: Vec<LoanResponse>,
}

/// GET /api/admin/loans?country=<code>
pub async fn list_loans(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListLoansQuery>,
    headers: HeaderMap,
) -> Result<Json<LoansListResponse>, AppError> {
    let override_code = country_override(query.country.as_deref(), &headers);
    let scope = resolve_tenant_scope(&identity, override_code.as_deref(), &state.countries).await?;

    let loans = state.loans.list(&scope).await?;

    Ok(Json(LoansListResponse {
        success: true,
        loans: loans.into_iter().map(LoanResponse::from).collect(),
    }))
}
