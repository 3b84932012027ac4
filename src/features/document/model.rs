use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct DocumentResponse {
    pub html: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SaveRequest {
    pub html: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SaveResponse {
    pub ok: bool,
    pub backup: Option<String>,
}
