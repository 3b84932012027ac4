use crate::domain::{MonotonicClock, SaveReceipt};
use crate::io::DocumentStore;
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Reads and replaces the canonical Document, keeping a backup of every
/// version it overwrites.
pub struct DocumentService {
    store: Box<dyn DocumentStore>,
    clock: Arc<MonotonicClock>,
    retention: Option<usize>,
}

impl DocumentService {
    // async because existing backups seed the clock
    pub async fn new(
        store: Box<dyn DocumentStore>,
        clock: Arc<MonotonicClock>,
        retention: Option<usize>,
    ) -> Result<Self> {
        let backups = store
            .list_backups()
            .await
            .context("Failed to list existing backups")?;

        if let Some(newest) = backups.last() {
            clock.observe(newest.token);
        }

        info!(
            "Document service ready for {} ({} existing backups)",
            store.document_name(),
            backups.len()
        );

        Ok(Self {
            store,
            clock,
            retention,
        })
    }

    pub fn document_name(&self) -> String {
        self.store.document_name()
    }

    pub async fn read(&self) -> Result<String> {
        self.store.read_document().await
    }

    /// Backs up the current Document, then overwrites it with `html`.
    ///
    /// A failed backup is logged and tolerated; a failed write is not.
    /// Concurrent saves are not coordinated: the last write to land wins.
    pub async fn save(&self, html: &str) -> Result<SaveReceipt> {
        if html.is_empty() {
            bail!("Refusing to replace {} with an empty document", self.document_name());
        }

        let token = self.clock.next_millis();
        let backup = match self.store.backup_document(token).await {
            Ok(name) => Some(name),
            Err(e) => {
                warn!("Backup skipped, continuing with save: {:#}", e);
                None
            }
        };

        if let Err(e) = self.store.write_document(html).await {
            error!("Failed to write {}: {:#}", self.document_name(), e);
            return Err(e);
        }

        info!(
            "Saved {} ({} bytes, backup {})",
            self.document_name(),
            html.len(),
            backup.as_deref().unwrap_or("none")
        );

        if let Some(keep) = self.retention {
            if let Err(e) = self.prune_backups(keep).await {
                warn!("Backup pruning failed: {:#}", e);
            }
        }

        Ok(SaveReceipt { backup })
    }

    /// Removes the oldest backups until at most `keep` remain.
    pub async fn prune_backups(&self, keep: usize) -> Result<usize> {
        let backups = self.store.list_backups().await?;
        if backups.len() <= keep {
            return Ok(0);
        }

        let excess = backups.len() - keep;
        for entry in backups.iter().take(excess) {
            self.store.remove_backup(&entry.name).await?;
        }

        info!("Pruned {} old backups", excess);
        Ok(excess)
    }
}
