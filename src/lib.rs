use crate::config::SiteConfig;
use crate::domain::MonotonicClock;
use crate::features::{document::document_router, functions::functions_router, uploads::uploads_router};
use crate::io::github::GithubContentStore;
use crate::io::local::{LocalAssetStore, LocalDocumentStore};
use crate::services::{DocumentService, RemoteCommitService, UploadService};
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

pub mod config;
pub mod domain;
pub mod editor;
pub mod features;
pub mod io;
pub mod services;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentService>,
    pub uploads: Arc<UploadService>,
    // absent when no repository credentials are configured
    pub remote: Option<Arc<RemoteCommitService>>,
    pub config: Arc<SiteConfig>,
}

/// Wires the filesystem stores (and the repository store, when configured)
/// into the services the routers share.
pub async fn build_state(config: SiteConfig) -> Result<AppState> {
    let clock = Arc::new(MonotonicClock::new());

    let documents = DocumentService::new(
        Box::new(LocalDocumentStore::new(config.document_path())),
        clock.clone(),
        config.backup_retention,
    )
    .await?;

    tokio::fs::create_dir_all(config.upload_path())
        .await
        .with_context(|| format!("Failed to create {}", config.upload_path().display()))?;

    let uploads = UploadService::new(
        Box::new(LocalAssetStore::new(config.upload_path())),
        clock.clone(),
        config.upload_url_prefix(),
    );

    let remote = match &config.remote {
        Some(remote_config) => {
            let store = GithubContentStore::new(remote_config)?;
            info!(
                "Remote store enabled for {}/{} on {}",
                remote_config.owner, remote_config.repo, remote_config.branch
            );
            Some(Arc::new(RemoteCommitService::new(
                Box::new(store),
                clock,
                config.upload_dir.clone(),
            )))
        }
        None => {
            warn!("GITHUB_TOKEN or GITHUB_REPO not set, /functions endpoints will refuse requests");
            None
        }
    };

    Ok(AppState {
        documents: Arc::new(documents),
        uploads: Arc::new(uploads),
        remote,
        config: Arc::new(config),
    })
}

pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    // api router, where features are composed
    let api_router = Router::new()
        .merge(document_router())
        .merge(uploads_router());

    Router::new()
        .nest("/api", api_router)
        .nest("/functions", functions_router())
        .route_service("/admin", ServeFile::new(config.admin_path()))
        .fallback_service(ServeDir::new(&config.site_root))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}
