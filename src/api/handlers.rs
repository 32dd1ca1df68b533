//! Request handlers.
//!
//! Handlers only decode parameters into domain types; all validation that
//! matters for correctness happens in the repository.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::ApiError;
use super::AppState;
use crate::error::LookupError;
use crate::models::{AdminArea, AdminLevel, AreaCode, GeoPoint, Tolerance};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub time: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LevelParams {
    pub level: Option<i64>,
    pub tolerance: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub coordinates: Vec<GeoPoint>,
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub coordinates: Vec<GeoPoint>,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            warn!("Health check: store ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            store: state.store.name(),
            time: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// `GET /v1/admin-areas?level=&tolerance=`; level defaults to countries
pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<LevelParams>, QueryRejection>,
) -> ApiResult<Vec<AdminArea>> {
    let Query(params) = params?;
    let level = AdminLevel::from_index(params.level.unwrap_or(0))?;
    let tolerance = Tolerance::from_option(params.tolerance)?;

    Ok(Json(state.repository.list(level, tolerance).await?))
}

/// `GET /v1/admin-areas/{level}/{id}?tolerance=`
pub async fn by_id(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
    params: Result<Query<LevelParams>, QueryRejection>,
) -> ApiResult<AdminArea> {
    let Path((level, id)) = path?;
    let Query(params) = params?;
    let level = AdminLevel::from_index(level)?;
    let tolerance = Tolerance::from_option(params.tolerance)?;

    Ok(Json(state.repository.get_by_id(id, level, tolerance).await?))
}

/// `GET /v1/admin-areas/code/{code}?level=&tolerance=`
pub async fn by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
    params: Result<Query<LevelParams>, QueryRejection>,
) -> ApiResult<AdminArea> {
    let Query(params) = params?;
    let code = match params.level {
        Some(level) => AreaCode::parse_at(&code, AdminLevel::from_index(level)?)?,
        None => AreaCode::parse(&code)?,
    };
    let tolerance = Tolerance::from_option(params.tolerance)?;

    Ok(Json(state.repository.get_by_code(&code, tolerance).await?))
}

/// `GET /v1/admin-areas/code/{code}/children?level=&tolerance=`
///
/// Without `level` the children one level below the parent are returned.
pub async fn children(
    State(state): State<AppState>,
    Path(code): Path<String>,
    params: Result<Query<LevelParams>, QueryRejection>,
) -> ApiResult<Vec<AdminArea>> {
    let Query(params) = params?;
    let parent = AreaCode::parse(&code)?;
    let child_level = match params.level {
        Some(level) => AdminLevel::from_index(level)?,
        None => parent.level().child().ok_or(LookupError::InvalidLevel {
            level: parent.level().index() as i64 + 1,
            reason: "must be between 0 and 4",
        })?,
    };
    let tolerance = Tolerance::from_option(params.tolerance)?;

    Ok(Json(
        state
            .repository
            .get_children(&parent, child_level, tolerance)
            .await?,
    ))
}

/// `POST /v1/boundaries/{code}/filter`
pub async fn filter_by_boundary(
    State(state): State<AppState>,
    Path(code): Path<String>,
    body: Result<Json<FilterRequest>, JsonRejection>,
) -> ApiResult<FilterResponse> {
    let Json(request) = body?;
    let boundary = AreaCode::parse(&code)?;

    let coordinates = state
        .repository
        .filter_coordinates_by_boundary(&request.coordinates, &boundary)
        .await?;

    info!(
        "Boundary filter {}: {} of {} points inside",
        boundary,
        coordinates.len(),
        request.coordinates.len()
    );

    Ok(Json(FilterResponse { coordinates }))
}
