//! REST API endpoints for the history-server.
//!
//! # Endpoints
//!
//! - `POST /location/{id}/now` - Record the current location (`{"lat": f64, "lng": f64}`)
//! - `GET /location/{id}?max=N` - Recent locations, oldest first (`max=0` or absent: no limit)
//! - `DELETE /location/{id}` - Clear the history for an identifier
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Uptime, TTL and store occupancy
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Unknown
//! identifiers return 404, undecodable bodies and query strings return 400.
//!
//! # Example
//!
//! ```ignore
//! use history_server::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use history_store::Location;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Health and status
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        // Location history
        .route("/location/{id}/now", post(add_location))
        .route("/location/{id}", get(get_locations).delete(clear_locations))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service version.
    pub version: &'static str,
    /// Current timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Maximum age of returned locations.
    pub ttl_seconds: u64,
    /// Identifiers with a history entry.
    pub identifiers: usize,
    /// Samples held in memory, including expired ones not yet cleared.
    pub samples: usize,
}

/// Get service status.
///
/// Takes a shared lock on the store while counting.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let stats = state.store.stats();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        uptime_seconds: state.uptime_seconds(),
        ttl_seconds: state.config.history.ttl_secs,
        identifiers: stats.identifiers,
        samples: stats.samples,
    })
}

/// Record the current location for an identifier.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] if the body is not a JSON location. The
/// store is left untouched in that case.
async fn add_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Location>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(location) = body
        .map_err(|e| AppError::BadRequest(format!("Invalid location payload: {}", e.body_text())))?;

    state.store.append(&id, location);
    Ok(StatusCode::OK)
}

/// Query parameters for reading a history window.
#[derive(Debug, Deserialize, Default)]
pub struct WindowQuery {
    /// Return at most this many of the most recent locations (0 means all).
    pub max: Option<usize>,
}

/// Get recent locations for an identifier, oldest first.
///
/// # Errors
///
/// - Returns [`AppError::BadRequest`] if `max` is not a non-negative integer
/// - Returns [`AppError::Store`] (404) if nothing was ever recorded for `id`
async fn get_locations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<Vec<Location>>, AppError> {
    let Query(params) =
        params.map_err(|e| AppError::BadRequest(format!("Invalid query: {}", e.body_text())))?;

    let window = state.store.get_window(&id, params.max.unwrap_or(0))?;
    debug!(id = %id, count = window.len(), "Returning location window");

    Ok(Json(window.into_iter().map(|s| s.location).collect()))
}

/// Clear the history for an identifier.
///
/// # Errors
///
/// Returns [`AppError::Store`] (404) if nothing was ever recorded for `id`.
async fn clear_locations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.clear(&id)?;
    Ok(StatusCode::OK)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Store(history_store::Error),
}

impl From<history_store::Error> for AppError {
    fn from(e: history_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e @ history_store::Error::NotFound(_)) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("No such endpoint".to_string())
}
