//! Backends the controller's requests are executed against.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::fs::listing::{DirectoryService, FileContent, Listing};
use crate::fs::run_blocking;

/// Source of listings and file contents.
pub trait Backend: Send + Sync + 'static {
    /// List a directory; `None` lists the backend's default directory.
    fn list(&self, path: Option<&Path>) -> impl Future<Output = Result<Listing>> + Send;

    fn read(&self, path: &Path) -> impl Future<Output = Result<FileContent>> + Send;

    /// Human-readable description for the status bar and logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to a `lfv serve` instance (or anything speaking the same `/files`
/// protocol) over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    files_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid server url {base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let files_url = base
            .join("files")
            .map_err(|e| AppError::Config(format!("invalid server url {base_url}: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            files_url,
        })
    }

    async fn get<T: DeserializeOwned>(&self, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .http
            .get(self.files_url.clone())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(AppError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

impl Backend for HttpBackend {
    async fn list(&self, path: Option<&Path>) -> Result<Listing> {
        let query: Vec<(&str, String)> = path
            .map(|p| vec![("path", p.to_string_lossy().into_owned())])
            .unwrap_or_default();
        self.get(&query).await
    }

    async fn read(&self, path: &Path) -> Result<FileContent> {
        let query = [
            ("path", path.to_string_lossy().into_owned()),
            ("action", "read".to_string()),
        ];
        self.get(&query).await
    }

    fn describe(&self) -> String {
        self.files_url.to_string()
    }
}

/// Reads the filesystem directly, without a server in between.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    service: Arc<DirectoryService>,
}

impl LocalBackend {
    pub fn new(service: DirectoryService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl Backend for LocalBackend {
    async fn list(&self, path: Option<&Path>) -> Result<Listing> {
        let service = Arc::clone(&self.service);
        let path: Option<PathBuf> = path.map(Path::to_path_buf);
        run_blocking(move || service.list(path.as_deref())).await
    }

    async fn read(&self, path: &Path) -> Result<FileContent> {
        let service = Arc::clone(&self.service);
        let path = path.to_path_buf();
        run_blocking(move || service.read(&path)).await
    }

    fn describe(&self) -> String {
        format!("local:{}", self.service.root().display())
    }
}
