//! Runtime side of the controller: the poll timer and request execution.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::Backend;
use crate::controller::{Request, Response};
use crate::event::Event;

/// Emits `Event::Poll` immediately and then every `interval`. Dropping the
/// poller cancels the timer; requests already in flight still complete.
pub struct Poller {
    timer: JoinHandle<()>,
}

impl Poller {
    pub fn start(interval: Duration, tx: mpsc::UnboundedSender<Event>) -> Self {
        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Event::Poll).is_err() {
                    break;
                }
            }
        });
        Self { timer }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Execute a controller request on its own task and report the result as
/// `Event::Response`.
pub fn dispatch<B: Backend>(backend: &Arc<B>, request: Request, tx: &mpsc::UnboundedSender<Event>) {
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        let response = match request {
            Request::List {
                ticket,
                origin,
                path,
            } => {
                let result = backend.list(path.as_deref()).await;
                Response::Listed {
                    ticket,
                    origin,
                    requested: path,
                    result,
                }
            }
            Request::Read {
                ticket,
                origin,
                path,
            } => {
                let result = backend.read(&path).await;
                Response::Loaded {
                    ticket,
                    origin,
                    path,
                    result,
                }
            }
        };
        let _ = tx.send(Event::Response(response));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LocalBackend;
    use crate::controller::Controller;
    use crate::fs::listing::DirectoryService;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn first_tick_is_immediate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _poller = Poller::start(Duration::from_secs(60), tx);
        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("tick before timeout");
        assert!(matches!(event, Some(Event::Poll)));
    }

    #[tokio::test]
    async fn ticks_repeat_until_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = Poller::start(Duration::from_millis(10), tx);
        for _ in 0..3 {
            assert!(matches!(rx.recv().await, Some(Event::Poll)));
        }
        drop(poller);

        // Once the timer task is gone its sender is dropped and the channel drains.
        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn dispatch_reports_listing_and_read() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("report_2024.json"), "{}").unwrap();
        let backend = Arc::new(LocalBackend::new(
            DirectoryService::new(dir.path()).unwrap(),
        ));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = Controller::new(None, true);

        dispatch(&backend, controller.poll(), &tx);
        let read = match rx.recv().await {
            Some(Event::Response(response @ Response::Listed { .. })) => {
                controller.apply(response).follow_up.expect("auto-follow read")
            }
            other => panic!("unexpected {other:?}"),
        };

        dispatch(&backend, read, &tx);
        match rx.recv().await {
            Some(Event::Response(response @ Response::Loaded { .. })) => {
                assert!(controller.apply(response).loaded.is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(controller.session().content.as_deref(), Some("{}"));
    }
}
