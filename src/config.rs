use std::path::PathBuf;
use tracing::warn;

const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub site_root: PathBuf,
    pub document_file: PathBuf,
    pub admin_file: PathBuf,
    pub upload_dir: String,
    pub bind_addr: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub backup_retention: Option<usize>,
    pub remote: Option<RemoteConfig>,
}

// settings for committing through a hosted git repository instead of the local disk
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub api_base: String,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let site_root = std::fs::canonicalize(
            std::env::var("SITE_ROOT").unwrap_or_else(|_| ".".to_string()),
        )
        .expect("Failed to resolve SITE_ROOT to an absolute path. Does the directory exist?");

        let document_file = PathBuf::from(
            std::env::var("DOCUMENT_FILE").unwrap_or_else(|_| "index.html".to_string()),
        );

        let admin_file = PathBuf::from(
            std::env::var("ADMIN_FILE").unwrap_or_else(|_| "admin.html".to_string()),
        );

        let upload_dir = normalize_upload_dir(
            &std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "assets/img/uploads".to_string()),
        );

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(3000);

        let max_body_bytes = std::env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let backup_retention = std::env::var("BACKUP_RETENTION")
            .ok()
            .and_then(|val| val.parse::<usize>().ok())
            .filter(|n| *n > 0);

        let remote = RemoteConfig::from_parts(
            std::env::var("GITHUB_TOKEN").ok(),
            std::env::var("GITHUB_REPO").ok(),
            std::env::var("GITHUB_BRANCH").ok(),
            std::env::var("GITHUB_API_BASE").ok(),
        );

        Self {
            site_root,
            document_file,
            admin_file,
            upload_dir,
            bind_addr,
            port,
            max_body_bytes,
            backup_retention,
            remote,
        }
    }

    /// A config rooted at `site_root` with every other setting at its default.
    #[cfg(test)]
    pub fn for_root(site_root: PathBuf) -> Self {
        Self {
            site_root,
            document_file: PathBuf::from("index.html"),
            admin_file: PathBuf::from("admin.html"),
            upload_dir: "assets/img/uploads".to_string(),
            bind_addr: "127.0.0.1".to_string(),
            port: 3000,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            backup_retention: None,
            remote: None,
        }
    }

    pub fn document_path(&self) -> PathBuf {
        self.site_root.join(&self.document_file)
    }

    pub fn admin_path(&self) -> PathBuf {
        self.site_root.join(&self.admin_file)
    }

    pub fn upload_path(&self) -> PathBuf {
        self.site_root.join(&self.upload_dir)
    }

    // the uploads directory doubles as its public url prefix
    pub fn upload_url_prefix(&self) -> String {
        format!("/{}", self.upload_dir)
    }
}

impl RemoteConfig {
    pub fn from_parts(
        token: Option<String>,
        repo: Option<String>,
        branch: Option<String>,
        api_base: Option<String>,
    ) -> Option<Self> {
        let token = token.filter(|t| !t.is_empty())?;
        let repo = repo.filter(|r| !r.is_empty())?;

        let Some((owner, repo_name)) = repo.split_once('/') else {
            warn!("GITHUB_REPO must look like owner/repo, got {}", repo);
            return None;
        };

        Some(Self {
            token,
            owner: owner.to_string(),
            repo: repo_name.to_string(),
            branch: branch
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "main".to_string()),
            api_base: api_base
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "https://api.github.com".to_string()),
        })
    }
}

fn normalize_upload_dir(raw: &str) -> String {
    raw.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}
