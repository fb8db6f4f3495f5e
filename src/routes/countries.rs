//! Country (tenant) route handlers

use crate::auth::{policy, Identity};
use crate::db::DbCountry;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct CountryResponse {
    pub id: i32,
    pub code: String,
    pub name: String,
}

impl From<DbCountry> for CountryResponse {
    fn from(country: DbCountry) -> Self {
        Self {
            id: country.id,
            code: country.code,
            name: country.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CountriesListResponse {
    pub success: bool,
    pub countries: Vec<CountryResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCountryRequest {
    #[validate(length(min = 2, max = 8, message = "code must be 2-8 characters"))]
    pub code: String,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CountryDetailResponse {
    pub success: bool,
    pub country: CountryResponse,
}

/// GET /api/admin/countries
///
/// Available to any authenticated identity; populates tenant selectors.
pub async fn list_countries(
    State(state): State<SharedState>,
    Extension(_identity): Extension<Identity>,
) -> Result<Json<CountriesListResponse>, AppError> {
    let countries = state.countries.list().await?;

    Ok(Json(CountriesListResponse {
        success: true,
        countries: countries.into_iter().map(CountryResponse::from).collect(),
    }))
}

/// POST /api/admin/countries
pub async fn create_country(
    State(state): State<SharedState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateCountryRequest>,
) -> Result<(StatusCode, Json<CountryDetailResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if !policy::can_manage_countries(&identity) {
        return Err(AppError::Forbidden(
            "only a superadmin may add countries".to_string(),
        ));
    }

    let code = req.code.trim().to_ascii_uppercase();
    let country = state.countries.create(&code, req.name.trim()).await?;

    info!(requestor = identity.id, code = %country.code, "Country created");

    Ok((
        StatusCode::CREATED,
        Json(CountryDetailResponse {
            success: true,
            country: country.into(),
        }),
    ))
}
