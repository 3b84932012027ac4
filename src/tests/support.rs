use crate::config::SiteConfig;
use crate::domain::{MonotonicClock, SaveReceipt, UploadReceipt};
use crate::editor::{EditorBackend, EditorUi, Layout, NodeId, Rect, SaveStatus, Size, UploadFile};
use crate::io::{RemoteContentStore, RemoteError};
use crate::services::RemoteCommitService;
use crate::{AppState, build_state};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const SITE_HTML: &str = "<!doctype html>\n<html><head><title>Foxi</title></head><body><h1 id=\"title\">Hello</h1><p id=\"intro\" style=\"color: red;\">Welcome <b>friend</b></p><img id=\"hero\" src=\"/assets/img/hero.png\" width=\"300\" height=\"200\"></body></html>";

// markup that trips naive handling: a data uri and quoted `;` inside styles, entities
// in attributes, raw text with `;`, and inline svg with namespaced attributes
pub const RICH_HTML: &str = "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>Foxi &amp; Friends</title><style>.cta > b { content: \"x;y\"; }</style></head><body><div id=\"banner\" style=\"background: url(&quot;data:image/png;base64,AAAA&quot;) no-repeat; color: red;\">Sale&nbsp;now</div><a id=\"cta\" href=\"/shop?a=1&amp;b=2\" title=\"Tom &amp; Jerry &quot;live&quot;\">Shop <span id=\"label\" style=\"font-family: 'Open Sans'; content: ';'\">now</span></a><svg id=\"icons\" xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" viewBox=\"0 0 10 10\"><use xlink:href=\"#icon-cart\"></use></svg><img id=\"product\" src=\"/assets/img/p.png\" width=\"0\" alt=\"Box\"></body></html>";

pub const BOUNDARY: &str = "----sitepress-test-boundary";

// --- Fixture: a throwaway site root on disk ---
// index.html and admin.html are seeded so every endpoint has something to work with
pub fn site_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), SITE_HTML).unwrap();
    std::fs::write(dir.path().join("admin.html"), "<html><body>admin</body></html>").unwrap();
    dir
}

pub async fn state_for(root: &Path) -> AppState {
    build_state(SiteConfig::for_root(root.to_path_buf()))
        .await
        .unwrap()
}

// same as state_for, but the /functions endpoints talk to the given fake repository
pub async fn state_with_remote(root: &Path, remote: MockRemoteStore) -> AppState {
    let mut state = state_for(root).await;
    state.remote = Some(Arc::new(RemoteCommitService::new(
        Box::new(remote),
        Arc::new(MonotonicClock::new()),
        state.config.upload_dir.clone(),
    )));
    state
}

// serve a router on an ephemeral port and hand back its base url
pub async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                field, name
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn backups_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with("index.html.bak."))
        .collect();
    names.sort();
    names
}

// --- Manual Mock: RemoteContentStore ---
// a pretend repository: paths map to their current sha, every put is recorded
#[derive(Clone, Default)]
pub struct MockRemoteStore {
    pub files: Arc<Mutex<HashMap<String, String>>>,
    pub puts: Arc<Mutex<Vec<RecordedPut>>>,
    pub put_failure: Arc<Mutex<Option<(u16, String)>>>,
}

#[derive(Clone, Debug)]
pub struct RecordedPut {
    pub path: String,
    pub content: String,
    pub message: String,
    pub revision: Option<String>,
}

impl MockRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, sha: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), sha.to_string());
    }

    pub fn fail_puts_with(&self, status: u16, body: &str) {
        *self.put_failure.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn recorded(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteContentStore for MockRemoteStore {
    async fn revision(&self, path: &str) -> std::result::Result<Option<String>, RemoteError> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    async fn put_contents(
        &self,
        path: &str,
        encoded_content: String,
        message: &str,
        revision: Option<String>,
    ) -> std::result::Result<Option<String>, RemoteError> {
        if let Some((status, body)) = self.put_failure.lock().unwrap().clone() {
            return Err(RemoteError::Upstream { status, body });
        }

        let mut puts = self.puts.lock().unwrap();
        puts.push(RecordedPut {
            path: path.to_string(),
            content: encoded_content,
            message: message.to_string(),
            revision,
        });
        let commit = format!("commit-{}", puts.len());
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), format!("sha-{}", puts.len()));
        Ok(Some(commit))
    }
}

// --- Manual Mock: EditorUi ---
// records everything shown to the user; prompt answers are queued up front
#[derive(Clone, Default)]
pub struct MockUi {
    pub notices: Arc<Mutex<Vec<String>>>,
    pub statuses: Arc<Mutex<Vec<SaveStatus>>>,
    pub labels: Arc<Mutex<Vec<String>>>,
    pub prompts: Arc<Mutex<Vec<(String, String)>>>,
    pub answers: Arc<Mutex<VecDeque<Option<String>>>>,
}

impl MockUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, reply: Option<&str>) {
        self.answers
            .lock()
            .unwrap()
            .push_back(reply.map(str::to_string));
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last_notice(&self) -> Option<String> {
        self.notices.lock().unwrap().last().cloned()
    }

    pub fn last_status(&self) -> Option<SaveStatus> {
        self.statuses.lock().unwrap().last().copied()
    }

    pub fn last_label(&self) -> Option<String> {
        self.labels.lock().unwrap().last().cloned()
    }
}

impl EditorUi for MockUi {
    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((message.to_string(), default.to_string()));
        self.answers.lock().unwrap().pop_front().flatten()
    }

    fn show_status(&self, status: SaveStatus) {
        self.statuses.lock().unwrap().push(status);
    }

    fn show_edit_label(&self, label: &str) {
        self.labels.lock().unwrap().push(label.to_string());
    }
}

// --- Manual Mock: EditorBackend ---
// keeps the "server side" in memory so controller tests never touch the network
#[derive(Clone, Default)]
pub struct MockBackend {
    pub document: Arc<Mutex<String>>,
    pub saved: Arc<Mutex<Vec<String>>>,
    pub uploads: Arc<Mutex<Vec<UploadFile>>>,
    pub save_failure: Arc<Mutex<Option<String>>>,
    pub upload_failure: Arc<Mutex<Option<String>>>,
}

impl MockBackend {
    pub fn with_document(html: &str) -> Self {
        let backend = Self::default();
        *backend.document.lock().unwrap() = html.to_string();
        backend
    }

    pub fn last_saved(&self) -> Option<String> {
        self.saved.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl EditorBackend for MockBackend {
    async fn load_document(&self) -> Result<String> {
        Ok(self.document.lock().unwrap().clone())
    }

    async fn save(&self, html: String) -> Result<SaveReceipt> {
        if let Some(msg) = self.save_failure.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(html.clone());
        *self.document.lock().unwrap() = html;
        Ok(SaveReceipt {
            backup: Some(format!("index.html.bak.{}", saved.len())),
        })
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt> {
        if let Some(msg) = self.upload_failure.lock().unwrap().clone() {
            return Err(anyhow!(msg));
        }
        let url = format!("/assets/img/uploads/{}", file.name);
        self.uploads.lock().unwrap().push(file);
        Ok(UploadReceipt { url })
    }
}

// --- Fixed geometry for drag and drop ---
pub struct FixedLayout {
    pub rect: Rect,
    pub scroll: (f64, f64),
    pub size: Option<Size>,
}

impl FixedLayout {
    pub fn new() -> Self {
        Self {
            rect: Rect {
                left: 10.0,
                top: 20.0,
                width: 300.0,
                height: 200.0,
            },
            scroll: (0.0, 100.0),
            size: Some(Size {
                width: 320.0,
                height: 240.0,
            }),
        }
    }
}

impl Layout for FixedLayout {
    fn bounding_rect(&self, _node: NodeId) -> Rect {
        self.rect
    }

    fn scroll_offset(&self) -> (f64, f64) {
        self.scroll
    }

    fn computed_size(&self, _node: NodeId) -> Option<Size> {
        self.size
    }
}

pub fn png_file(name: &str) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        mime: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
    }
}
