//! Device inventory route handlers
//!
//! Listing only: inventory rows are written by the import tooling outside
//! this service, and are filtered here through the same tenant scope as
//! every other read.

use crate::auth::Identity;
use crate::db::DbDevice;
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
pub struct ListDevicesQuery {
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: i32,
    pub model: String,
    pub serial_no: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbDevice> for DeviceResponse {
    fn from(device: DbDevice) -> Self {
        Self {
            id: device.id,
            model: device.model,
            serial_no: device.serial_no,
            country_code: device.country_code,
            created_at: device.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DevicesListResponse {
    pub success: bool,
    pub devices: Vec<DeviceResponse>,
}

/// GET /api/admin/devices?country=<code>
pub async fn list_devices(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListDevicesQuery>,
    headers: HeaderMap,
) -> Result<Json<DevicesListResponse>, AppError> {
    let override_code = country_override(query.country.as_deref(), &headers);
    let scope = resolve_tenant_scope(&identity, override_code.as_deref(), &state.countries).await?;

    let devices = state.devices.list(&scope).await?;

    Ok(Json(DevicesListResponse {
        success: true,
        devices: devices.into_iter().map(DeviceResponse::from).collect(),
    }))
}
