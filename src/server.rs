//! HTTP front of the directory service: a single `GET /files` resource.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::fs::listing::DirectoryService;
use crate::fs::run_blocking;

#[derive(Clone)]
struct ServerState {
    service: Arc<DirectoryService>,
}

/// Query string of `GET /files`.
#[derive(Debug, Default, Deserialize)]
pub struct FilesQuery {
    pub path: Option<String>,
    pub action: Option<String>,
}

pub fn router(service: DirectoryService) -> Router {
    Router::new().route("/files", get(files)).with_state(ServerState {
        service: Arc::new(service),
    })
}

async fn files(State(state): State<ServerState>, Query(query): Query<FilesQuery>) -> Response {
    let path = query.path.filter(|p| !p.is_empty()).map(PathBuf::from);
    let result = handle(state.service, path.clone(), query.action.as_deref()).await;

    match result {
        Ok(response) => response,
        Err(e) => {
            if e.status().is_server_error() {
                warn!(path = ?path, error = %e, "request failed");
            } else {
                debug!(path = ?path, error = %e, "request rejected");
            }
            e.into_response()
        }
    }
}

async fn handle(
    service: Arc<DirectoryService>,
    path: Option<PathBuf>,
    action: Option<&str>,
) -> Result<Response> {
    match action {
        None | Some("") | Some("list") => {
            let listing = run_blocking(move || service.list(path.as_deref())).await?;
            Ok(Json(listing).into_response())
        }
        Some("read") => {
            let path =
                path.ok_or_else(|| AppError::BadRequest("read requires a path".to_string()))?;
            let file = run_blocking(move || service.read(&path)).await?;
            Ok(Json(file).into_response())
        }
        Some(other) => Err(AppError::BadRequest(format!("unknown action: {other}"))),
    }
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, service: DirectoryService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, root = %service.root().display(), "serving directory");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::listing::{EntryFilter, Listing};
    use std::fs::{self, File};
    use std::net::SocketAddr;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("d1")).unwrap();
        for (name, secs) in [("f1.json", 10), ("f2.json", 20)] {
            let path = dir.path().join(name);
            fs::write(&path, format!("{{\"name\":\"{name}\"}}")).unwrap();
            File::open(&path)
                .unwrap()
                .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
                .unwrap();
        }
        dir
    }

    async fn spawn(service: DirectoryService) -> (SocketAddr, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, service, async {
            let _ = rx.await;
        }));
        (addr, tx)
    }

    #[tokio::test]
    async fn lists_default_directory() {
        let dir = setup_test_dir();
        let (addr, _stop) = spawn(DirectoryService::new(dir.path()).unwrap()).await;

        let listing: Listing = reqwest::get(format!("http://{addr}/files"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<&str> = listing.files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["d1", "f2.json", "f1.json"]);
        assert_eq!(listing.path, dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn listing_json_shape() {
        let dir = setup_test_dir();
        let (addr, _stop) = spawn(DirectoryService::new(dir.path()).unwrap()).await;

        let body: serde_json::Value = reqwest::get(format!("http://{addr}/files?path=d1"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(body["path"].as_str().unwrap().ends_with("d1"));
        assert_eq!(body["files"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn reads_file_content() {
        let dir = setup_test_dir();
        let (addr, _stop) = spawn(DirectoryService::new(dir.path()).unwrap()).await;

        let body: serde_json::Value =
            reqwest::get(format!("http://{addr}/files?path=f2.json&action=read"))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        assert_eq!(body, serde_json::json!({ "content": "{\"name\":\"f2.json\"}" }));
    }

    #[tokio::test]
    async fn missing_path_is_404_with_error_body() {
        let dir = setup_test_dir();
        let (addr, _stop) = spawn(DirectoryService::new(dir.path()).unwrap()).await;

        let response = reqwest::get(format!("http://{addr}/files?path=nope.json&action=read"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("nope.json"));
    }

    #[tokio::test]
    async fn reading_directory_is_404() {
        let dir = setup_test_dir();
        let (addr, _stop) = spawn(DirectoryService::new(dir.path()).unwrap()).await;

        let response = reqwest::get(format!("http://{addr}/files?path=d1&action=read"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_action_is_400() {
        let dir = setup_test_dir();
        let (addr, _stop) = spawn(DirectoryService::new(dir.path()).unwrap()).await;

        let response = reqwest::get(format!("http://{addr}/files?action=delete"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Bad request: unknown action: delete");
    }

    #[tokio::test]
    async fn read_without_path_is_400() {
        let dir = setup_test_dir();
        let (addr, _stop) = spawn(DirectoryService::new(dir.path()).unwrap()).await;

        let response = reqwest::get(format!("http://{addr}/files?action=read"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn extension_filter_applies_to_http_listing() {
        let dir = setup_test_dir();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        let service = DirectoryService::new(dir.path())
            .unwrap()
            .with_filter(EntryFilter::new(&["json".to_string()], true));
        let (addr, _stop) = spawn(service).await;

        let listing: Listing = reqwest::get(format!("http://{addr}/files"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(listing.files.iter().all(|e| e.name != "notes.txt"));
        assert_eq!(listing.files.len(), 3);
    }
}
