//! Store switching
//!
//! At most one ingestion task runs at a time. Switching stores takes the task
//! slot, advances the session generation so anything the old task still
//! dispatches is rejected as stale, then aborts the old task and spawns the
//! new one. The slot lock is held across all three steps, so the task left in
//! the slot always belongs to the newest session.

use crate::ingest::{FeedIngestor, IngestReport};
use parking_lot::Mutex;
use pulse_core::SessionGuard;
use tokio::task::JoinHandle;

/// Owns the in-flight ingestion task
#[derive(Debug)]
pub struct FeedController {
    ingestor: FeedIngestor,
    task: Mutex<Option<JoinHandle<IngestReport>>>,
}

impl FeedController {
    /// Create controller with no session running
    #[must_use]
    pub fn new(ingestor: FeedIngestor) -> Self {
        Self {
            ingestor,
            task: Mutex::new(None),
        }
    }

    /// Ingestor driving each session
    #[inline]
    #[must_use]
    pub fn ingestor(&self) -> &FeedIngestor {
        &self.ingestor
    }

    /// Tear down the current session and start ingesting `store_id`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn switch_store(&self, store_id: impl Into<String>) -> SessionGuard {
        let mut task = self.task.lock();
        let guard = self.ingestor.store().begin_session(store_id);
        if let Some(previous) = task.take() {
            previous.abort();
            tracing::debug!(store = guard.store_id(), "Aborted previous feed task");
        }
        let ingestor = self.ingestor.clone();
        let session = guard.clone();
        *task = Some(tokio::spawn(async move { ingestor.run(session).await }));
        guard
    }

    /// Abort the running task and leave the store idle
    pub fn teardown(&self) {
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }
        self.ingestor.store().end_session();
    }

    /// Wait for the running task
    ///
    /// `None` when nothing is running or the task was aborted.
    pub async fn wait(&self) -> Option<IngestReport> {
        let task = self.task.lock().take()?;
        match task.await {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::debug!(error = %err, "Feed task did not finish");
                None
            }
        }
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
