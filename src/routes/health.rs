use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::cities::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when healthy, "degraded" when the selection store is unreadable)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the selection store can be read
    pub selection_store: bool,
}

/// Health check endpoint.
///
/// Does not call OpenAQ; upstream problems show up as empty search results
/// and in the logs. Returns status "degraded" (still 200) if the selection
/// store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_ok = match state.selections.list().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Health check: selection store unreadable: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if store_ok {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        selection_store: store_ok,
    })
}
