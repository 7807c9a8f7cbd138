//! Runtime abstraction layer for async operations
//!
//! Raster loads run as background tasks on the ambient tokio runtime. Callers
//! keep an [`AsyncHandle`] so an in-flight load can be aborted when the scene
//! is disposed or superseded.

use crate::{QuakeError, Result};
use std::future::Future;
use tokio::task::JoinHandle;

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task
    fn cancel(&self);
}

struct TokioHandle(JoinHandle<()>);

impl AsyncHandle for TokioHandle {
    fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    fn cancel(&self) {
        self.0.abort();
    }
}

/// Spawns `future` on the current tokio runtime.
///
/// Fails with [`QuakeError::Runtime`] when called outside a runtime context.
pub fn spawn<F>(future: F) -> Result<Box<dyn AsyncHandle>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|e| QuakeError::Runtime(format!("no tokio runtime: {}", e)))?;
    log::debug!("spawning background task");
    Ok(Box::new(TokioHandle(handle.spawn(future))))
}

/// True when a tokio runtime is reachable from this thread
pub fn has_runtime() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tokio_spawner() {
        let handle = spawn(async {
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        })
        .unwrap();

        assert!(!handle.is_finished());

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_cancel_stops_task() {
        let (tx, rx) = crossbeam_channel::unbounded::<()>();
        let handle = spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            let _ = tx.send(());
        })
        .unwrap();
        handle.cancel();

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        assert!(handle.is_finished());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        assert!(!has_runtime());
        assert!(matches!(spawn(async {}), Err(QuakeError::Runtime(_))));
    }
}
