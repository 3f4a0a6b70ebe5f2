//! Task supervision for the daemon.
//!
//! Background tasks (the health surface, the reporter) run under a
//! tracker with a shared cancellation token, so SIGINT/SIGTERM drains
//! in-flight work within a bounded window instead of aborting it.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

/// Supervises the daemon's background tasks.
#[derive(Clone)]
pub struct Supervisor {
    tracker: TaskTracker,
    token: CancellationToken,
    shutdown_timeout: Duration,
}

impl Supervisor {
    /// Create a supervisor with the given graceful-shutdown window.
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            tracker: TaskTracker::new(),
            token: CancellationToken::new(),
            shutdown_timeout,
        }
    }

    /// Token shared with every supervised task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a task that is cancelled when shutdown begins.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let token = self.token.clone();
        self.tracker.spawn(async move {
            tokio::select! {
                biased;

                _ = token.cancelled() => {
                    info!("[{}] received shutdown signal, stopping", name);
                }
                result = future => {
                    match result {
                        Ok(()) => info!("[{}] task completed", name),
                        Err(e) => error!("[{}] task failed: {:?}", name, e),
                    }
                }
            }
        });
    }

    /// Cancel all tasks and wait for them, up to the shutdown timeout.
    pub async fn shutdown(&self) {
        info!("initiating graceful shutdown");
        self.tracker.close();
        self.token.cancel();

        if tokio::time::timeout(self.shutdown_timeout, self.tracker.wait())
            .await
            .is_err()
        {
            warn!(
                "shutdown timeout ({:?}) exceeded, some tasks may still be running",
                self.shutdown_timeout
            );
        } else {
            info!("all tasks terminated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::time::sleep;

    #[tokio::test]
    async fn shutdown_cancels_long_running_tasks() {
        let supervisor = Supervisor::new(Duration::from_secs(5));
        let finished = Arc::new(AtomicBool::new(false));

        let finished_clone = finished.clone();
        supervisor.spawn("sleeper", async move {
            sleep(Duration::from_secs(60)).await;
            finished_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        sleep(Duration::from_millis(20)).await;
        supervisor.shutdown().await;
        assert!(!finished.load(Ordering::SeqCst), "task was cancelled, not run to completion");
    }

    #[tokio::test]
    async fn completed_tasks_do_not_block_shutdown() {
        let supervisor = Supervisor::new(Duration::from_secs(1));
        supervisor.spawn("quick", async { Ok(()) });
        sleep(Duration::from_millis(20)).await;
        supervisor.shutdown().await;
    }
}
