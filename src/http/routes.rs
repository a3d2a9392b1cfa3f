//! HTTP route definitions.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;

use super::{boats, create_cors_layer, create_trace_layer};
use crate::{config::ApiVersion, database::BoatStore, errors::BoatsApiError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BoatStore>,
    pub version: ApiVersion,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn BoatStore>, version: ApiVersion) -> Self {
        Self {
            store,
            version,
            start_time: Instant::now(),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub api: &'static str,
    pub uptime_secs: u64,
}

/// Create the router for the configured API version.
pub fn create_router(state: AppState) -> Router {
    let router = match state.version {
        ApiVersion::V1 => Router::new()
            .route("/", get(root))
            .route(
                "/boats",
                get(boats::list_boats)
                    .post(boats::create_boat)
                    .fallback(not_found),
            )
            .route(
                "/boats/:id",
                put(boats::update_boat)
                    .delete(boats::delete_boat)
                    .fallback(not_found),
            ),
        ApiVersion::V2 => Router::new()
            .route(
                "/api/boats",
                get(boats::list_boats)
                    .post(boats::create_boat)
                    .fallback(not_found),
            )
            .route(
                "/api/boats/:id",
                get(boats::get_boat)
                    .put(boats::update_boat)
                    .delete(boats::delete_boat)
                    .fallback(not_found),
            ),
    };

    router
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(create_trace_layer())
                .layer(create_cors_layer()),
        )
        .with_state(state)
}

/// Unrouted methods on a boat path read as a miss.
async fn not_found() -> BoatsApiError {
    BoatsApiError::NotFound
}

/// Root endpoint.
async fn root() -> &'static str {
    "EV Boats API is running"
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        api: state.version.as_str(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
