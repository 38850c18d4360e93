//! Department listing

use axum::{extract::State, routing::get, Json, Router};
use roster_common::Department;

use crate::{db, error::ApiResult, AppState};

/// GET /api/departments
///
/// Active departments ordered by display name.
pub async fn list_departments(State(state): State<AppState>) -> ApiResult<Json<Vec<Department>>> {
    let departments = db::list_active_departments(&state.db).await?;
    Ok(Json(departments))
}

/// Build department routes
pub fn department_routes() -> Router<AppState> {
    Router::new().route("/api/departments", get(list_departments))
}
