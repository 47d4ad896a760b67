//! Headless follower: prints each newly auto-selected file to a writer.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::client::Backend;
use crate::controller::Controller;
use crate::error::Result;
use crate::event::{Event, EventHandler};
use crate::poller::{dispatch, Poller};

/// Follow the newest file until `shutdown` resolves, writing a
/// `==> path <==` header and the content each time a new file is loaded.
pub async fn run<B, W, F>(
    backend: Arc<B>,
    mut controller: Controller,
    interval: Duration,
    out: &mut W,
    shutdown: F,
) -> Result<()>
where
    B: Backend,
    W: Write,
    F: Future<Output = ()>,
{
    let mut events = EventHandler::headless();
    let tx = events.sender();
    let _poller = Poller::start(interval, tx.clone());
    info!(source = %backend.describe(), ?interval, "following newest file");

    tokio::pin!(shutdown);
    loop {
        let event = tokio::select! {
            _ = &mut shutdown => break,
            event = events.next() => event?,
        };

        match event {
            Event::Poll => dispatch(&backend, controller.poll(), &tx),
            Event::Response(response) => {
                let update = controller.apply(response);
                if let Some(request) = update.follow_up {
                    dispatch(&backend, request, &tx);
                }
                if update.loaded.is_some() {
                    let session = controller.session();
                    if let (Some(path), Some(content)) = (&session.selected_path, &session.content)
                    {
                        debug!(path = %path.display(), bytes = content.len(), "printing file");
                        writeln!(out, "==> {} <==", path.display())?;
                        writeln!(out, "{content}")?;
                        out.flush()?;
                    }
                }
            }
            Event::Key(_) | Event::Tick | Event::Resize(_, _) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LocalBackend;
    use crate::fs::listing::DirectoryService;
    use std::fs::{self, File};
    use std::time::UNIX_EPOCH;
    use tempfile::TempDir;

    fn write_with_mtime(dir: &TempDir, name: &str, content: &str, secs: u64) {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        File::open(&path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[tokio::test]
    async fn prints_newest_file_once() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(&dir, "old.json", "old", 100);
        write_with_mtime(&dir, "report_2024.json", "{\"n\":1}", 200);
        let backend = Arc::new(LocalBackend::new(
            DirectoryService::new(dir.path()).unwrap(),
        ));

        let mut out = Vec::new();
        run(
            backend,
            Controller::new(None, true),
            Duration::from_millis(20),
            &mut out,
            tokio::time::sleep(Duration::from_millis(300)),
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("==> ").count(), 1);
        assert!(text.contains("report_2024.json <=="));
        assert!(text.contains("{\"n\":1}"));
        assert!(!text.contains("old"));
    }

    #[tokio::test]
    async fn follows_file_created_later() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(&dir, "first.json", "1", 100);
        let backend = Arc::new(LocalBackend::new(
            DirectoryService::new(dir.path()).unwrap(),
        ));

        let root = dir.path().to_path_buf();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let path = root.join("second.json");
            fs::write(&path, "2").unwrap();
            File::open(&path)
                .unwrap()
                .set_modified(UNIX_EPOCH + Duration::from_secs(200))
                .unwrap();
        });

        let mut out = Vec::new();
        run(
            backend,
            Controller::new(None, true),
            Duration::from_millis(20),
            &mut out,
            tokio::time::sleep(Duration::from_millis(500)),
        )
        .await
        .unwrap();
        writer.await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let first = text.find("first.json <==").expect("first printed");
        let second = text.find("second.json <==").expect("second printed");
        assert!(first < second);
        assert_eq!(text.matches("==> ").count(), 2);
    }

    #[tokio::test]
    async fn paused_controller_prints_nothing() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(&dir, "a.json", "a", 100);
        let backend = Arc::new(LocalBackend::new(
            DirectoryService::new(dir.path()).unwrap(),
        ));

        let mut out = Vec::new();
        run(
            backend,
            Controller::new(None, false),
            Duration::from_millis(20),
            &mut out,
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await
        .unwrap();
        assert!(out.is_empty());
    }
}
