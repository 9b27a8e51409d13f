//! Selected-city endpoints.
//!
//! - GET /api/v1/selections
//! - POST /api/v1/selections/:id
//! - DELETE /api/v1/selections/:id

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::{AppError, ErrorResponse};
use crate::models::CityAirQuality;
use crate::routes::air_quality::{require_air_quality, require_city};
use crate::routes::cities::AppState;
use crate::services::air_quality::fetch_many;

/// List the selected cities with their current readings.
///
/// Selected cities that currently have no data are omitted.
#[utoipa::path(
    get,
    path = "/api/v1/selections",
    tag = "Selections",
    responses(
        (status = 200, description = "Current readings for each selected city", body = Vec<CityAirQuality>),
    )
)]
pub async fn list_selections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CityAirQuality>>, AppError> {
    let cities = state.selections.list().await?;
    Ok(Json(fetch_many(&state.client, &cities).await))
}

/// Select a city.
///
/// The city is only stored when air quality data is available for it.
/// Selecting an already selected city returns 200 without storing it twice.
#[utoipa::path(
    post,
    path = "/api/v1/selections/{id}",
    tag = "Selections",
    params(
        ("id" = i64, Path, description = "City id (upstream location id)"),
    ),
    responses(
        (status = 201, description = "City selected", body = CityAirQuality),
        (status = 200, description = "City was already selected", body = CityAirQuality),
        (status = 404, description = "Unknown city, or no data available for it", body = ErrorResponse),
    )
)]
pub async fn add_selection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<CityAirQuality>), AppError> {
    let city = require_city(&state, id).await?;
    let air_quality = require_air_quality(&state, &city).await?;

    let status = if state.selections.add(city).await? {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(air_quality)))
}

/// Remove a city from the selections. Unknown ids are ignored.
#[utoipa::path(
    delete,
    path = "/api/v1/selections/{id}",
    tag = "Selections",
    params(
        ("id" = i64, Path, description = "City id"),
    ),
    responses(
        (status = 204, description = "City no longer selected"),
    )
)]
pub async fn remove_selection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.selections.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::openaq::OpenAqClient;
    use crate::services::selections::{InMemorySelectionStore, Selections};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn state_with_upstream() -> (MockServer, AppState) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": 1, "locality": "Bristol", "datetimeLast": {"utc": "2026-03-01T07:00:00Z"},
                     "sensors": [{"id": 11, "name": "pm25", "parameter": {"id": 2, "name": "pm25"}}]},
                    {"id": 2, "locality": "Bath", "sensors": []}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/1/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"sensorsId": 11, "value": 7.456, "datetime": {"utc": "2026-03-01T07:00:00Z"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/locations/2/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let state = AppState {
            client: OpenAqClient::new(&server.uri(), "key", 79, 1000),
            selections: Selections::new(InMemorySelectionStore::default()),
        };
        (server, state)
    }

    #[tokio::test]
    async fn test_select_list_and_remove() {
        let (_server, state) = state_with_upstream().await;

        let (status, Json(record)) = add_selection(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record.city_name, "Bristol");
        assert_eq!(record.metrics["PM25"], 7.46);

        let (status, _) = add_selection(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(status, StatusCode::OK);

        let Json(listed) = list_selections(State(state.clone())).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "1");

        let status = remove_selection(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        let Json(listed) = list_selections(State(state)).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_city_without_data_is_not_selected() {
        let (_server, state) = state_with_upstream().await;

        let err = add_selection(State(state.clone()), Path(2)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(state.selections.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_city_is_not_found() {
        let (_server, state) = state_with_upstream().await;

        let err = add_selection(State(state), Path(404)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_unknown_is_no_content() {
        let (_server, state) = state_with_upstream().await;
        let status = remove_selection(State(state), Path(99)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
