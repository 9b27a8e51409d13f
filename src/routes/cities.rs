//! City search endpoint.
//!
//! - GET /api/v1/cities?query=<substring>

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::City;
use crate::services::cities::resolve;
use crate::services::openaq::OpenAqClient;
use crate::services::selections::Selections;

/// Shared application state.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) client: OpenAqClient,
    pub(crate) selections: Selections,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CityQuery {
    /// Case-insensitive substring of the city name; omit to list every city
    pub query: Option<String>,
}

/// Search canonical cities by name.
///
/// Returns one city per locality (the most recently reporting station).
/// Upstream failures yield an empty list rather than an error.
#[utoipa::path(
    get,
    path = "/api/v1/cities",
    tag = "Cities",
    params(CityQuery),
    responses(
        (status = 200, description = "Matching cities", body = Vec<City>),
    )
)]
pub async fn list_cities(
    State(state): State<AppState>,
    Query(params): Query<CityQuery>,
) -> Json<Vec<City>> {
    let query = params.query.unwrap_or_default();
    Json(resolve(&state.client, &query).await)
}
