//! Authentication route handlers

use crate::auth::{create_token, verify_login, Identity, Role};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub role: Role,
    pub country_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub country_id: Option<i32>,
}

/// POST /api/auth/login
///
/// Authenticate with email and password, receive a session token. A missing
/// account and a wrong password produce byte-identical responses.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state.users.find_by_email(req.email.trim()).await?;

    verify_login(&req.password, user.as_ref().map(|u| u.password_hash.as_str()))?;

    // verify_login errors on the None path, so the account exists here
    let user = user.ok_or(AppError::InvalidCredentials)?;

    let token = create_token(user.id, &user.email, user.role, user.country_id)?;
    info!(user_id = user.id, "Login");

    Ok(Json(LoginResponse {
        success: true,
        token,
        role: user.role,
        country_id: user.country_id,
    }))
}

/// GET /api/auth/me
///
/// Echo the verified identity with a fresh projection of the account.
pub async fn me(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .users
        .find_by_id(identity.id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    Ok(Json(MeResponse {
        success: true,
        id: user.id,
        email: user.email,
        role: user.role,
        country_id: user.country_id,
    }))
}
