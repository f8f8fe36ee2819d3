//! Feed ingestion
//!
//! Drives one store session from a [`FeedSource`]:
//! - Decodes each framed event and dispatches it in arrival order
//! - Drops malformed events and keeps reading
//! - Falls back to a single snapshot fetch when the stream fails or ends
//!   without `complete`
//! - Marks the session `error` only when the fallback fails as well
//!
//! Every dispatch carries the session's [`SessionGuard`], and the guard is
//! checked again after each await point, so a replaced session never sees
//! late events.

use crate::event::FeedEvent;
use crate::narration::intro_narration;
use crate::source::{FeedSource, SpeechSink};
use futures::StreamExt;
use pulse_core::{Command, CopilotStore, Outcome, SessionGuard, TransportError};
use std::sync::Arc;

/// How an ingestion run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEnd {
    /// Stream delivered `complete`
    Completed,
    /// Stream failed and the snapshot fallback filled in
    Recovered,
    /// Stream and snapshot both failed
    Failed,
    /// Session was replaced before the run finished
    Cancelled,
}

/// Summary of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub end: IngestEnd,
    /// Events dispatched to the store
    pub applied: usize,
    /// Events dropped as malformed
    pub dropped: usize,
}

impl IngestReport {
    fn new() -> Self {
        Self {
            end: IngestEnd::Cancelled,
            applied: 0,
            dropped: 0,
        }
    }

    fn finish(mut self, end: IngestEnd) -> Self {
        self.end = end;
        self
    }
}

/// Feeds one store session from a source into the shared store
#[derive(Clone)]
pub struct FeedIngestor {
    store: Arc<CopilotStore>,
    source: Arc<dyn FeedSource>,
    speech: Option<Arc<dyn SpeechSink>>,
}

impl FeedIngestor {
    /// Create new ingestor
    #[must_use]
    pub fn new(store: Arc<CopilotStore>, source: Arc<dyn FeedSource>) -> Self {
        Self {
            store,
            source,
            speech: None,
        }
    }

    /// With a sink for the intro narration
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechSink>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Shared store this ingestor writes to
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<CopilotStore> {
        &self.store
    }

    /// Ingest the feed for the session behind `guard`
    pub async fn run(&self, guard: SessionGuard) -> IngestReport {
        let mut report = IngestReport::new();
        let store_id = guard.store_id().to_string();
        tracing::info!(store = %store_id, source = self.source.name(), "Opening feed");

        let mut stream = match self.source.open(&store_id).await {
            Ok(stream) => stream,
            Err(err) => return self.fallback(&guard, err, report).await,
        };
        if !self.store.is_current(&guard) {
            tracing::debug!(store = %store_id, "Session replaced while opening feed");
            return report;
        }

        while let Some(item) = stream.next().await {
            if !self.store.is_current(&guard) {
                tracing::debug!(store = %store_id, "Discarding events of replaced session");
                return report;
            }
            let raw = match item {
                Ok(raw) => raw,
                Err(err) => return self.fallback(&guard, err, report).await,
            };
            let event = match FeedEvent::decode(&raw) {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(event = %raw.name, error = %err, "Dropping malformed event");
                    report.dropped += 1;
                    continue;
                }
            };

            let complete = event.is_complete();
            tracing::debug!(event = event.name(), "Feed event");
            if self.store.dispatch_for(&guard, event.into_command()) == Outcome::Stale {
                return report;
            }
            report.applied += 1;
            if complete {
                self.announce(&guard);
                return report.finish(IngestEnd::Completed);
            }
        }

        self.fallback(&guard, TransportError::EndedEarly, report).await
    }

    async fn fallback(
        &self,
        guard: &SessionGuard,
        cause: TransportError,
        report: IngestReport,
    ) -> IngestReport {
        if !self.store.is_current(guard) {
            return report;
        }
        let store_id = guard.store_id();
        tracing::warn!(store = %store_id, error = %cause, "Feed interrupted, fetching snapshot");

        match self.source.snapshot(store_id).await {
            Ok(snapshot) => {
                if self.store.dispatch_for(guard, Command::IngestSnapshot(snapshot))
                    == Outcome::Stale
                {
                    tracing::debug!(store = %store_id, "Discarding snapshot of replaced session");
                    return report;
                }
                self.store.dispatch_for(guard, Command::Complete);
                tracing::info!(store = %store_id, "Snapshot fallback ingested");
                self.announce(guard);
                report.finish(IngestEnd::Recovered)
            }
            Err(err) => {
                let reason = format!("{cause}; {err}");
                if self.store.dispatch_for(guard, Command::FeedFailed { reason }) == Outcome::Stale
                {
                    return report;
                }
                report.finish(IngestEnd::Failed)
            }
        }
    }

    /// Hand the intro to the speech sink without waiting for it
    fn announce(&self, guard: &SessionGuard) {
        let Some(speech) = self.speech.clone() else {
            return;
        };
        let Some(text) = self.store.read(intro_narration) else {
            return;
        };
        let store_id = guard.store_id().to_string();
        tokio::spawn(async move {
            if let Err(err) = speech.speak(&store_id, &text).await {
                tracing::warn!(store = %store_id, error = %err, "Intro narration failed");
            }
        });
    }
}

impl std::fmt::Debug for FeedIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedIngestor")
            .field("source", &self.source.name())
            .field("speech", &self.speech.is_some())
            .finish_non_exhaustive()
    }
}
