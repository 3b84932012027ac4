use crate::domain::{SaveReceipt, UploadReceipt};
use crate::features::document::model::{DocumentResponse, SaveRequest, SaveResponse};
use crate::features::uploads::UPLOAD_FIELD;
use crate::features::uploads::model::UploadResponse;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};

/// A file picked up by a drop event.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

// where the controller loads from and persists to
#[async_trait]
pub trait EditorBackend: Send + Sync {
    async fn load_document(&self) -> Result<String>;
    async fn save(&self, html: String) -> Result<SaveReceipt>;
    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt>;
}

/// Talks to the admin server's `/api` endpoints.
pub struct HttpEditorBackend {
    client: Client,
    base: Url,
}

impl HttpEditorBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("Invalid server url {}", base_url))?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Invalid endpoint {}", path))
    }
}

// the server answers failures in plain text, which becomes the error message
async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        bail!("{}", status);
    }
    bail!("{}", body)
}

#[async_trait]
impl EditorBackend for HttpEditorBackend {
    async fn load_document(&self) -> Result<String> {
        let response = self.client.get(self.endpoint("/api/index")?).send().await?;
        let body: DocumentResponse = ensure_success(response).await?.json().await?;
        Ok(body.html)
    }

    async fn save(&self, html: String) -> Result<SaveReceipt> {
        let response = self
            .client
            .post(self.endpoint("/api/save")?)
            .json(&SaveRequest { html: Some(html) })
            .send()
            .await?;

        let body: SaveResponse = ensure_success(response).await?.json().await?;
        Ok(SaveReceipt {
            backup: body.backup,
        })
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt> {
        let mut part = Part::bytes(file.bytes).file_name(file.name);
        if let Some(mime) = &file.mime {
            part = part.mime_str(mime)?;
        }

        let response = self
            .client
            .post(self.endpoint("/api/upload")?)
            .multipart(Form::new().part(UPLOAD_FIELD, part))
            .send()
            .await?;

        let body: UploadResponse = ensure_success(response).await?.json().await?;
        Ok(UploadReceipt { url: body.url })
    }
}
