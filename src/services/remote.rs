use crate::domain::naming::upload_file_name;
use crate::domain::{CommitReceipt, MonotonicClock};
use crate::io::{RemoteContentStore, RemoteError, verify_repo_path};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use derive_more::Display;
use std::sync::Arc;
use tracing::info;

const DEFAULT_DOCUMENT_PATH: &str = "index.html";

#[derive(Debug, Display)]
pub enum CommitError {
    #[display("{_0}")]
    Invalid(String),
    #[display("{_0}")]
    Remote(RemoteError),
}

impl std::error::Error for CommitError {}

impl From<RemoteError> for CommitError {
    fn from(e: RemoteError) -> Self {
        CommitError::Remote(e)
    }
}

/// Save and upload against a hosted repository: look up the current
/// revision, then create or update the file in one commit. No retries.
pub struct RemoteCommitService {
    store: Box<dyn RemoteContentStore>,
    clock: Arc<MonotonicClock>,
    upload_dir: String,
}

impl RemoteCommitService {
    pub fn new(
        store: Box<dyn RemoteContentStore>,
        clock: Arc<MonotonicClock>,
        upload_dir: String,
    ) -> Self {
        Self {
            store,
            clock,
            upload_dir,
        }
    }

    pub async fn save(
        &self,
        path: Option<&str>,
        content: &str,
    ) -> Result<CommitReceipt, CommitError> {
        if content.is_empty() {
            return Err(CommitError::Invalid("Missing content".to_string()));
        }

        let path = verify_repo_path(path.unwrap_or(DEFAULT_DOCUMENT_PATH))
            .map_err(|e| CommitError::Invalid(e.to_string()))?;

        let message = format!("Update {} via admin", path);
        let commit = self.commit(&path, STANDARD.encode(content), &message).await?;

        Ok(CommitReceipt { commit, url: None })
    }

    /// `content` arrives base64-encoded and is committed as-is once it
    /// decodes cleanly.
    pub async fn upload(
        &self,
        filename: Option<&str>,
        content: &str,
    ) -> Result<CommitReceipt, CommitError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CommitError::Invalid("No file uploaded".to_string()));
        }
        if STANDARD.decode(content).is_err() {
            return Err(CommitError::Invalid(
                "Upload content is not valid base64".to_string(),
            ));
        }

        let stored_name = upload_file_name(filename.unwrap_or_default(), self.clock.next_millis());
        let path = format!("{}/{}", self.upload_dir, stored_name);

        let message = format!("Upload {} via admin", path);
        let commit = self.commit(&path, content.to_string(), &message).await?;

        Ok(CommitReceipt {
            commit,
            url: Some(format!("/{}", path)),
        })
    }

    async fn commit(
        &self,
        path: &str,
        encoded: String,
        message: &str,
    ) -> Result<Option<String>, RemoteError> {
        let revision = self.store.revision(path).await?;
        let commit = self
            .store
            .put_contents(path, encoded, message, revision)
            .await?;

        info!(
            "Committed {} ({})",
            path,
            commit.as_deref().unwrap_or("no commit id")
        );
        Ok(commit)
    }
}
