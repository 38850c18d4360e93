//! roster-server library
//!
//! HTTP backend for the user roster: CSV bulk import, user listing and
//! editing, department listing.

use axum::http::Method;
use axum::Router;
use roster_common::config::DEFAULT_MAX_UPLOAD_BYTES;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod directory;
pub mod error;
pub mod import;

pub use crate::directory::DepartmentDirectory;
pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Department codes loaded at startup; never mutated afterwards
    pub directory: Arc<DepartmentDirectory>,
    /// Cap on the upload request body
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, directory: DepartmentDirectory) -> Self {
        Self {
            db,
            directory: Arc::new(directory),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::upload_routes(state.max_upload_bytes))
        .merge(api::user_routes())
        .merge(api::department_routes())
        .merge(api::health_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive CORS for browser clients served from another origin
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}
