pub mod model;

use crate::AppState;
use crate::features::ApiError;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    routing::{get, post},
};
use model::{DocumentResponse, SaveRequest, SaveResponse};
use tracing::error;

pub fn document_router() -> Router<AppState> {
    Router::new()
        .route("/index", get(get_document_handler))
        .route("/save", post(save_document_handler))
}

async fn get_document_handler(
    State(state): State<AppState>,
) -> Result<Json<DocumentResponse>, ApiError> {
    match state.documents.read().await {
        Ok(html) => Ok(Json(DocumentResponse { html })),
        Err(e) => {
            error!("{:#}", e);
            Err(ApiError::Storage(format!(
                "Could not read {}",
                state.documents.document_name()
            )))
        }
    }
}

// the body is parsed by hand so an absent or malformed body is a plain 400, never a side effect
async fn save_document_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ApiError> {
    let request: SaveRequest = serde_json::from_slice(&body).unwrap_or_default();

    let html = match request.html {
        Some(html) if !html.is_empty() => html,
        _ => return Err(ApiError::BadRequest("Missing html".to_string())),
    };

    let receipt = state.documents.save(&html).await.map_err(|_| {
        ApiError::Storage(format!(
            "Failed to write {}",
            state.documents.document_name()
        ))
    })?;

    Ok(Json(SaveResponse {
        ok: true,
        backup: receipt.backup,
    }))
}
