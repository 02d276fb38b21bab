//! Graceful shutdown handling.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Stops the background tasks of a run.
///
/// Cancels `cancel` (stopping the progress logger and the Ctrl-C watcher),
/// then waits for the logger task and, when given, the record writer task.
pub async fn shutdown_gracefully<T>(
    cancel: CancellationToken,
    logging_task: Option<JoinHandle<()>>,
    writer_task: Option<JoinHandle<T>>,
) -> Option<T> {
    cancel.cancel();
    if let Some(logging_task) = logging_task {
        let _ = logging_task.await;
    }

    match writer_task {
        Some(task) => match task.await {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Writer task failed: {:?}", e);
                None
            }
        },
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_stops_logger_and_returns_writer_value() {
        let cancel = CancellationToken::new();
        let watched = cancel.child_token();
        let logger = tokio::spawn(async move { watched.cancelled().await });
        let writer = tokio::spawn(async { 42usize });

        let written = shutdown_gracefully(cancel.clone(), Some(logger), Some(writer)).await;

        assert!(cancel.is_cancelled());
        assert_eq!(written, Some(42));
    }
}
