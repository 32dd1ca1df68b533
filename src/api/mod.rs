//! HTTP API over the admin area repository.

pub mod error;
mod handlers;

use axum::{
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;
use crate::repository::AdminAreaRepository;
use crate::store::SpatialStore;

pub use error::ApiError;
pub use handlers::{FilterRequest, FilterResponse, HealthResponse};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn AdminAreaRepository>,
    /// Pinged by the health check
    pub store: Arc<dyn SpatialStore>,
}

impl AppState {
    pub fn new(repository: Arc<dyn AdminAreaRepository>, store: Arc<dyn SpatialStore>) -> Self {
        Self { repository, store }
    }
}

/// Build the service router
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/admin-areas", get(handlers::list))
        .route("/v1/admin-areas/{level}/{id}", get(handlers::by_id))
        .route("/v1/admin-areas/code/{code}", get(handlers::by_code))
        .route(
            "/v1/admin-areas/code/{code}/children",
            get(handlers::children),
        )
        .route(
            "/v1/boundaries/{code}/filter",
            post(handlers::filter_by_boundary),
        )
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
