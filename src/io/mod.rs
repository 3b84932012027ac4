use anyhow::{Result, anyhow};
use async_trait::async_trait;
use derive_more::Display;

pub mod github;
pub mod local;

// the canonical page plus its backups
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// File name of the Document, used as the prefix of every backup name.
    fn document_name(&self) -> String;

    async fn read_document(&self) -> Result<String>;

    /// Copies the current Document to a new backup and returns the backup's name.
    async fn backup_document(&self, token: i64) -> Result<String>;

    async fn write_document(&self, html: &str) -> Result<()>;

    /// Existing backups, oldest first.
    async fn list_backups(&self) -> Result<Vec<BackupEntry>>;

    async fn remove_backup(&self, name: &str) -> Result<()>;
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn store_asset(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

// a hosted git repository addressed through a contents api
#[async_trait]
pub trait RemoteContentStore: Send + Sync {
    /// Revision token of the file at `path`, or `None` if it does not exist yet.
    async fn revision(&self, path: &str) -> std::result::Result<Option<String>, RemoteError>;

    /// Creates or updates `path` with already base64-encoded content and
    /// returns the resulting commit id.
    async fn put_contents(
        &self,
        path: &str,
        encoded_content: String,
        message: &str,
        revision: Option<String>,
    ) -> std::result::Result<Option<String>, RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub token: i64,
}

#[derive(Debug, Display)]
pub enum RemoteError {
    // body is passed through untouched
    #[display("{body}")]
    Upstream { status: u16, body: String },
    #[display("{_0}")]
    Transport(String),
}

impl std::error::Error for RemoteError {}

/// Normalizes a repository-relative path, refusing anything that would
/// escape the repository root.
pub fn verify_repo_path(raw: &str) -> Result<String> {
    let unified = raw.replace('\\', "/");

    if unified.starts_with('/') || unified.contains(':') {
        return Err(anyhow!("Path {} must be relative to the repository root", raw));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(anyhow!("Path {} escapes the repository root", raw)),
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(anyhow!("Path {} does not name a file", raw));
    }

    Ok(segments.join("/"))
}
