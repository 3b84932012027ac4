use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::{StatusCode, header};
use derive_more::Display;
use serde_json::json;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display("{_0}")]
    BadRequest(String),
    #[display("No file uploaded")]
    NoFile,
    #[display("{_0}")]
    Storage(String),
    // a non-success answer from the remote store, relayed as received
    #[display("{body}")]
    Upstream { status: StatusCode, body: String },
    #[display("Missing GITHUB_TOKEN or GITHUB_REPO env var")]
    NotConfigured,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NoFile => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No file uploaded" })),
            )
                .into_response(),
            ApiError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
            ApiError::Upstream { status, body } => {
                if serde_json::from_str::<serde_json::Value>(&body).is_ok() {
                    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
                } else {
                    (status, body).into_response()
                }
            }
            ApiError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Missing GITHUB_TOKEN or GITHUB_REPO env var",
            )
                .into_response(),
        }
    }
}
