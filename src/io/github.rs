use crate::config::RemoteConfig;
use crate::io::{RemoteContentStore, RemoteError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

const AGENT: &str = "sitepress-admin";

/// Commits files through the GitHub REST contents API.
pub struct GithubContentStore {
    client: Client,
    api_base: Url,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

#[derive(Deserialize)]
struct ContentsMetadata {
    sha: Option<String>,
}

#[derive(Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Deserialize)]
struct PutContentsResponse {
    commit: Option<CommitRef>,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: Option<String>,
}

impl GithubContentStore {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base)
            .with_context(|| format!("Invalid GitHub API base {}", config.api_base))?;

        Ok(Self {
            client: Client::new(),
            api_base,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        })
    }

    // /repos/{owner}/{repo}/contents/{path}, each segment percent-encoded
    fn contents_url(&self, path: &str) -> std::result::Result<Url, RemoteError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("{} cannot be a base url", self.api_base)))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
            .extend(path.split('/'));
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(USER_AGENT, AGENT)
            .header(ACCEPT, "application/vnd.github+json")
    }
}

#[async_trait]
impl RemoteContentStore for GithubContentStore {
    async fn revision(&self, path: &str) -> std::result::Result<Option<String>, RemoteError> {
        let mut url = self.contents_url(path)?;
        url.query_pairs_mut().append_pair("ref", &self.branch);

        debug!("Looking up revision of {} on {}", path, self.branch);
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let metadata: ContentsMetadata = response
                    .json()
                    .await
                    .map_err(|e| RemoteError::Transport(e.to_string()))?;
                Ok(metadata.sha)
            }
            // file doesn't exist yet, so this is a create
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(upstream(status, response).await),
        }
    }

    async fn put_contents(
        &self,
        path: &str,
        encoded_content: String,
        message: &str,
        revision: Option<String>,
    ) -> std::result::Result<Option<String>, RemoteError> {
        let url = self.contents_url(path)?;
        let payload = PutContentsRequest {
            message,
            content: encoded_content,
            branch: &self.branch,
            sha: revision,
        };

        let response = self
            .authorized(self.client.put(url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(upstream(response.status(), response).await);
        }

        let body: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(body.commit.and_then(|c| c.sha))
    }
}

async fn upstream(status: StatusCode, response: reqwest::Response) -> RemoteError {
    let body = response.text().await.unwrap_or_default();
    RemoteError::Upstream {
        status: status.as_u16(),
        body,
    }
}
