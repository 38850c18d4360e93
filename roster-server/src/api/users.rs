//! User listing, update, and delete

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};
use roster_common::{User, UserUpdate};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    db,
    error::{ApiError, ApiResult},
    AppState,
};

/// Body returned after a successful update
#[derive(Debug, Serialize)]
pub struct UpdateUserResponse {
    pub message: String,
    pub user: Option<User>,
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = db::list_users(&state.db).await?;
    Ok(Json(users))
}

/// PUT /api/users/:id
///
/// Unparseable bodies are 400 (axum would otherwise answer 422 for
/// type errors).
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<Json<UpdateUserResponse>> {
    let Json(update) = payload
        .map_err(|e| ApiError::BadRequest(format!("Invalid data provided: {}", e.body_text())))?;

    db::update_user(&state.db, &id, &update.trimmed()).await?;
    let user = db::get_user(&state.db, &id).await?;

    Ok(Json(UpdateUserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    db::delete_user(&state.db, &id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

/// Build user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/:id", put(update_user).delete(delete_user))
}
