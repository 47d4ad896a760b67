pub mod listing;

use crate::error::{AppError, Result};

/// Run blocking filesystem work off the async runtime's worker threads.
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Task(e.to_string()))?
}
