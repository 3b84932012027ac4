use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
pub struct SaveFunctionRequest {
    pub path: Option<String>,
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UploadFunctionRequest {
    pub filename: Option<String>,
    // base64
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SaveFunctionResponse {
    pub ok: bool,
    pub commit: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UploadFunctionResponse {
    pub ok: bool,
    pub url: String,
    pub commit: Option<String>,
}
