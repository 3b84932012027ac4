pub mod model;

use crate::AppState;
use crate::features::ApiError;
use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use model::UploadResponse;
use tracing::error;

pub const UPLOAD_FIELD: &str = "file";

pub fn uploads_router() -> Router<AppState> {
    Router::new().route("/upload", post(upload_handler))
}

async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        // an empty file input still sends the part, just without a name
        let Some(file_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_owned)
        else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let receipt = state.uploads.store(&file_name, &bytes).await.map_err(|e| {
            error!("Upload of {} failed: {:#}", file_name, e);
            ApiError::Storage(e.to_string())
        })?;

        return Ok(Json(UploadResponse { url: receipt.url }));
    }

    Err(ApiError::NoFile)
}
