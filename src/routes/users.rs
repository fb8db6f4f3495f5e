//! Admin user-management route handlers
//!
//! Every handler runs against the verified identity attached by the auth
//! middleware: reads resolve a tenant scope first, mutations consult the
//! role authorization policy before touching storage.

use crate::auth::{hash_password, policy, Identity, Role};
use crate::db::DbUser;
use crate::error::{not_found_error, validation_error, AppError};
use crate::scope::{country_override, resolve_tenant_scope};
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub country_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbUser> for UserResponse {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            country_id: user.country_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub success: bool,
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email(message = "valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// GET /api/admin/users?country=<code>
///
/// Users visible under the caller's resolved tenant scope, newest first.
pub async fn list_users(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListUsersQuery>,
    headers: HeaderMap,
) -> Result<Json<UsersListResponse>, AppError> {
    let override_code = country_override(query.country.as_deref(), &headers);
    let scope = resolve_tenant_scope(&identity, override_code.as_deref(), &state.countries).await?;

    let users = state.users.list(&scope).await?;

    Ok(Json(UsersListResponse {
        success: true,
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/admin/users
///
/// Create a user. The policy decides who may mint which role, and a
/// COUNTRY_ADMIN's new user is always pinned to the admin's own country, no
/// matter what `countryCode` the request carries.
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDetailResponse>), AppError> {
    validate_payload(&req)?;

    if !policy::can_create_user(&identity, req.role) {
        return Err(AppError::Forbidden(format!(
            "{} may not create {} users",
            identity.role, req.role
        )));
    }

    // Only a SUPERADMIN's explicit country choice is looked up; for pinned
    // roles the policy below overrides whatever the request says.
    let requested_country = match (&identity.role, &req.country_code) {
        (Role::Superadmin, Some(code)) => {
            let code = code.trim().to_ascii_uppercase();
            let country = state
                .countries
                .find_by_code(&code)
                .await?
                .ok_or_else(|| validation_error(format!("unknown country code: {}", code)))?;
            Some(country.id)
        }
        _ => None,
    };
    let country_id = policy::assigned_country(&identity, requested_country);

    let password_hash = hash_password(&req.password)?;
    let user = state
        .users
        .create(req.email.trim(), &password_hash, req.role, country_id)
        .await?;

    info!(
        requestor = identity.id,
        created = user.id,
        role = %user.role,
        "User created"
    );

    Ok((
        StatusCode::CREATED,
        Json(UserDetailResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

/// PATCH /api/admin/users/{id}/password
pub async fn update_password(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<OkResponse>, AppError> {
    validate_payload(&req)?;

    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found_error("User not found"))?;

    if !policy::can_change_password(&identity, target.country_id) {
        return Err(AppError::Forbidden(
            "not allowed to change this user's password".to_string(),
        ));
    }

    let password_hash = hash_password(&req.new_password)?;
    if !state.users.update_password(target.id, &password_hash).await? {
        return Err(not_found_error("User not found"));
    }

    info!(requestor = identity.id, target = target.id, "Password changed");

    Ok(Json(OkResponse { success: true }))
}

/// PATCH /api/admin/users/{id}/role
pub async fn update_role(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<UserDetailResponse>, AppError> {
    if !policy::can_change_role(&identity) {
        return Err(AppError::Forbidden(
            "only a superadmin may change roles".to_string(),
        ));
    }

    let user = state
        .users
        .update_role(id, req.role)
        .await?
        .ok_or_else(|| not_found_error("User not found"))?;

    info!(requestor = identity.id, target = user.id, role = %user.role, "Role changed");

    Ok(Json(UserDetailResponse {
        success: true,
        user: user.into(),
    }))
}

/// DELETE /api/admin/users/{id}
///
/// Gated exactly like creation.
pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i32>,
) -> Result<Json<OkResponse>, AppError> {
    let target = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found_error("User not found"))?;

    if !policy::can_delete_user(&identity, target.role, target.country_id) {
        return Err(AppError::Forbidden(
            "not allowed to delete this user".to_string(),
        ));
    }

    state.users.delete(target.id).await?;

    info!(requestor = identity.id, target = target.id, "User deleted");

    Ok(Json(OkResponse { success: true }))
}
