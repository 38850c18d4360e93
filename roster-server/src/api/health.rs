//! Health check endpoint
//!
//! Reports liveness plus store reachability and the size of the department
//! snapshot. An unreachable store answers 503 so load balancers stop routing
//! imports to this instance.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use roster_common::db::check_connectivity;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub departments: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, status, database) = match check_connectivity(&state.db).await {
        Ok(()) => (StatusCode::OK, "ok", "connected"),
        Err(e) => {
            warn!("Health check could not reach database: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            module: "roster-server",
            version: env!("CARGO_PKG_VERSION"),
            database,
            departments: state.directory.len(),
        }),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
