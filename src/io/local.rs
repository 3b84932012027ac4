use crate::domain::naming::{backup_file_name, parse_backup_token};
use crate::io::{AssetStore, BackupEntry, DocumentStore};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;
use walkdir::WalkDir;

pub struct LocalDocumentStore {
    pub document_path: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(document_path: PathBuf) -> Self {
        Self { document_path }
    }

    fn directory(&self) -> &Path {
        self.document_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    fn document_name(&self) -> String {
        self.document_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    async fn read_document(&self) -> Result<String> {
        fs::read_to_string(&self.document_path)
            .await
            .with_context(|| format!("Could not read {}", self.document_path.display()))
    }

    async fn backup_document(&self, token: i64) -> Result<String> {
        let backup_name = backup_file_name(&self.document_name(), token);
        let backup_path = self.directory().join(&backup_name);

        fs::copy(&self.document_path, &backup_path)
            .await
            .with_context(|| format!("Could not back up to {}", backup_path.display()))?;

        Ok(backup_name)
    }

    // write next to the document, then rename over it, so readers never see a half-written page
    async fn write_document(&self, html: &str) -> Result<()> {
        let temp_path = self
            .directory()
            .join(format!(".{}.{}.tmp", self.document_name(), Uuid::new_v4()));

        fs::write(&temp_path, html)
            .await
            .with_context(|| format!("Could not write {}", temp_path.display()))?;

        if let Err(e) = fs::rename(&temp_path, &self.document_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(anyhow!(
                "Could not replace {}: {}",
                self.document_path.display(),
                e
            ));
        }

        Ok(())
    }

    async fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        let document_name = self.document_name();
        let mut entries = Vec::new();

        for entry in WalkDir::new(self.directory())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(token) = parse_backup_token(&document_name, &name) {
                entries.push(BackupEntry { name, token });
            }
        }

        entries.sort_by_key(|e| e.token);
        Ok(entries)
    }

    async fn remove_backup(&self, name: &str) -> Result<()> {
        // never let a caller remove anything that isn't one of our backups
        if parse_backup_token(&self.document_name(), name).is_none() {
            return Err(anyhow!("{} is not a backup of {}", name, self.document_name()));
        }

        fs::remove_file(self.directory().join(name))
            .await
            .with_context(|| format!("Could not remove backup {}", name))
    }
}

pub struct LocalAssetStore {
    pub upload_dir: PathBuf,
}

impl LocalAssetStore {
    pub fn new(upload_dir: PathBuf) -> Self {
        Self { upload_dir }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store_asset(&self, name: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| format!("Could not create {}", self.upload_dir.display()))?;

        let path = self.upload_dir.join(name);
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Could not write {}", path.display()))
    }
}
