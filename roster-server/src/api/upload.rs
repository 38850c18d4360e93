//! CSV bulk upload endpoint

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::{
    db::SqliteUserBatch,
    error::{ApiError, ApiResult},
    import::{self, ImportError},
    AppState,
};

/// Multipart field carrying the CSV file
pub const FILE_FIELD: &str = "file";

/// Upload outcome
///
/// `errors` is omitted on full success.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub imported: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// POST /api/upload-users
///
/// 200 when every row was written, 202 when some rows were skipped.
pub async fn upload_users(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Invalid multipart body", state.max_upload_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string).unwrap_or_default();
        let data = field.bytes().await.map_err(|e| {
            multipart_error(e, "Failed to read uploaded file", state.max_upload_bytes)
        })?;
        upload = Some((filename, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    };

    if !filename.to_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest(
            "Invalid file format. Please upload a CSV file.".to_string(),
        ));
    }

    let rows = import::parse_upload(&data)?;
    info!(file = %filename, rows = rows.len(), "Processing user upload");

    let batch = SqliteUserBatch::begin(&state.db)
        .await
        .map_err(ImportError::Begin)?;
    let report = import::run_import(&state.directory, &rows, batch).await?;

    if report.is_complete() {
        Ok((
            StatusCode::OK,
            Json(UploadResponse {
                message: "Users uploaded successfully.".to_string(),
                imported: report.imported,
                errors: Vec::new(),
            }),
        ))
    } else {
        Ok((
            StatusCode::ACCEPTED,
            Json(UploadResponse {
                message: "Users uploaded with some errors.".to_string(),
                imported: report.imported,
                errors: report.error_messages(),
            }),
        ))
    }
}

/// Body-limit hits become 413; every other multipart failure is a bad request
fn multipart_error(err: MultipartError, context: &str, max_upload_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!(
            "Upload exceeds the {} byte limit",
            max_upload_bytes
        ))
    } else {
        ApiError::BadRequest(format!("{}: {}", context, err))
    }
}

/// Build upload routes with the configured body limit
pub fn upload_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/upload-users", post(upload_users))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
