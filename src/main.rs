// Air Quality API v0.1
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use routes::cities::AppState;
use services::openaq::OpenAqClient;
use services::selections::{InMemorySelectionStore, JsonFileSelectionStore, Selections};

/// Air Quality API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Air Quality API",
        version = "0.1.0",
        description = "Search UK air-quality monitoring locations by city and compare \
            their latest pollutant readings side by side. Proxies the OpenAQ API, \
            keeps one canonical monitoring station per locality, and reduces raw \
            sensor measurements to one latest value per pollutant.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Cities", description = "City search"),
        (name = "Air quality", description = "Latest pollutant readings"),
        (name = "Selections", description = "The user's selected cities"),
    ),
    paths(
        routes::health::health_check,
        routes::cities::list_cities,
        routes::air_quality::get_city_air_quality,
        routes::air_quality::compare_air_quality,
        routes::selections::list_selections,
        routes::selections::add_selection,
        routes::selections::remove_selection,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            models::City,
            models::Sensor,
            models::CityAirQuality,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "air_quality_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let client = OpenAqClient::new(
        &config.openaq_base_url,
        &config.openaq_api_key,
        config.country_id,
        config.page_limit,
    );

    let selections = if config.selections_path.is_empty() {
        tracing::warn!("SELECTIONS_PATH is empty, selections will not survive a restart");
        Selections::new(InMemorySelectionStore::default())
    } else {
        let store = JsonFileSelectionStore::new(&config.selections_path);
        tracing::info!("Persisting selections to {}", store.path().display());
        Selections::new(store)
    };

    let app_state = AppState { client, selections };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/cities", get(routes::cities::list_cities))
        .route(
            "/api/v1/cities/:id/air-quality",
            get(routes::air_quality::get_city_air_quality),
        )
        .route(
            "/api/v1/air-quality",
            get(routes::air_quality::compare_air_quality),
        )
        .route(
            "/api/v1/selections",
            get(routes::selections::list_selections),
        )
        .route(
            "/api/v1/selections/:id",
            post(routes::selections::add_selection).delete(routes::selections::remove_selection),
        )
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
