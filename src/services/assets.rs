use crate::domain::naming::upload_file_name;
use crate::domain::{MonotonicClock, UploadReceipt};
use crate::io::AssetStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct UploadService {
    store: Box<dyn AssetStore>,
    clock: Arc<MonotonicClock>,
    url_prefix: String,
}

impl UploadService {
    pub fn new(store: Box<dyn AssetStore>, clock: Arc<MonotonicClock>, url_prefix: String) -> Self {
        Self {
            store,
            clock,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Stores `bytes` under a sanitized, timestamped name derived from
    /// `original_name` and returns its public URL.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<UploadReceipt> {
        let stored_name = upload_file_name(original_name, self.clock.next_millis());
        self.store.store_asset(&stored_name, bytes).await?;

        info!("Stored upload {} as {}", original_name, stored_name);

        Ok(UploadReceipt {
            url: format!("{}/{}", self.url_prefix, stored_name),
        })
    }
}
