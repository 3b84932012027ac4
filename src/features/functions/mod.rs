pub mod model;

use crate::AppState;
use crate::features::ApiError;
use crate::io::RemoteError;
use crate::services::{CommitError, RemoteCommitService};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    routing::post,
};
use http::StatusCode;
use model::{SaveFunctionRequest, SaveFunctionResponse, UploadFunctionRequest, UploadFunctionResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

/// Save and upload backed by the hosted repository instead of the local disk.
pub fn functions_router() -> Router<AppState> {
    Router::new()
        .route("/save", post(remote_save_handler))
        .route("/upload", post(remote_upload_handler))
}

async fn remote_save_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveFunctionResponse>, ApiError> {
    let remote = remote_service(&state)?;
    let request: SaveFunctionRequest = parse_body(&body)?;

    let receipt = remote
        .save(
            request.path.as_deref(),
            request.content.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(commit_error)?;

    Ok(Json(SaveFunctionResponse {
        ok: true,
        commit: receipt.commit,
    }))
}

async fn remote_upload_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UploadFunctionResponse>, ApiError> {
    let remote = remote_service(&state)?;
    let request: UploadFunctionRequest = parse_body(&body)?;

    let receipt = remote
        .upload(
            request.filename.as_deref(),
            request.content.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(commit_error)?;

    Ok(Json(UploadFunctionResponse {
        ok: true,
        url: receipt.url.unwrap_or_default(),
        commit: receipt.commit,
    }))
}

fn remote_service(state: &AppState) -> Result<Arc<RemoteCommitService>, ApiError> {
    state.remote.clone().ok_or(ApiError::NotConfigured)
}

// an empty body behaves like `{}`
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

fn commit_error(e: CommitError) -> ApiError {
    match e {
        CommitError::Invalid(msg) => ApiError::BadRequest(msg),
        CommitError::Remote(RemoteError::Upstream { status, body }) => {
            warn!("Remote store answered {}: {}", status, body);
            ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                body,
            }
        }
        CommitError::Remote(RemoteError::Transport(msg)) => ApiError::Storage(msg),
    }
}
