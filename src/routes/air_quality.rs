//! Air quality HTTP endpoints.
//!
//! - GET /api/v1/cities/:id/air-quality
//! - GET /api/v1/air-quality?ids=1,2,3

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{AppError, ErrorResponse};
use crate::models::{City, CityAirQuality};
use crate::routes::cities::AppState;
use crate::services::air_quality::{fetch_city_air_quality, fetch_many};
use crate::services::cities::{find_city, resolve};

/// Maximum number of cities in one comparison request.
const MAX_COMPARE_CITIES: usize = 20;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CompareQuery {
    /// Comma-separated city ids (e.g. "2508,3117")
    pub ids: String,
}

/// Parse a comma-separated list of city ids, ignoring blank items.
pub(crate) fn parse_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid city id '{}'", part)))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Err(AppError::BadRequest("At least one city id is required".to_string()));
    }
    if ids.len() > MAX_COMPARE_CITIES {
        return Err(AppError::BadRequest(format!(
            "At most {} cities can be compared at once",
            MAX_COMPARE_CITIES
        )));
    }
    Ok(ids)
}

/// Look up a canonical city or fail with 404.
pub(crate) async fn require_city(state: &AppState, id: i64) -> Result<City, AppError> {
    find_city(&state.client, id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("City {} not found", id)))
}

/// Fetch air quality for a city, mapping "no data" to 404.
pub(crate) async fn require_air_quality(
    state: &AppState,
    city: &City,
) -> Result<CityAirQuality, AppError> {
    fetch_city_air_quality(&state.client, city)
        .await
        .ok_or_else(|| {
            AppError::NotFound(format!("No air quality data available for {}", city.name))
        })
}

/// Get the latest pollutant readings for one city.
#[utoipa::path(
    get,
    path = "/api/v1/cities/{id}/air-quality",
    tag = "Air quality",
    params(
        ("id" = i64, Path, description = "City id (upstream location id)"),
    ),
    responses(
        (status = 200, description = "Latest readings for the city", body = CityAirQuality),
        (status = 404, description = "Unknown city, or no data available for it", body = ErrorResponse),
    )
)]
pub async fn get_city_air_quality(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CityAirQuality>, AppError> {
    let city = require_city(&state, id).await?;
    Ok(Json(require_air_quality(&state, &city).await?))
}

/// Compare the latest readings of several cities side by side.
///
/// Unknown ids and cities without data are left out of the result.
#[utoipa::path(
    get,
    path = "/api/v1/air-quality",
    tag = "Air quality",
    params(CompareQuery),
    responses(
        (status = 200, description = "Readings for every city with data, in request order", body = Vec<CityAirQuality>),
        (status = 400, description = "Invalid or missing ids", body = ErrorResponse),
    )
)]
pub async fn compare_air_quality(
    State(state): State<AppState>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<Vec<CityAirQuality>>, AppError> {
    let ids = parse_ids(&params.ids)?;

    let all = resolve(&state.client, "").await;
    let cities: Vec<City> = ids
        .iter()
        .filter_map(|id| all.iter().find(|c| c.id == *id).cloned())
        .collect();

    Ok(Json(fetch_many(&state.client, &cities).await))
}
