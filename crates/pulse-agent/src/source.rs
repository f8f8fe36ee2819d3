//! Collaborator traits
//!
//! The engine never talks HTTP itself. A [`FeedSource`] supplies the event
//! stream and the snapshot fallback, an [`InstructionProvider`] answers
//! delegated free-text instructions, and a [`SpeechSink`] turns narration
//! text into audio somewhere outside the core.

use crate::event::RawEvent;
use futures::stream::BoxStream;
use pulse_core::TransportError;
use pulse_model::{InstructionRequest, InstructionResponse, SnapshotPayload};

/// Stream of framed events for one store
pub type EventStream = BoxStream<'static, Result<RawEvent, TransportError>>;

/// Recommendation feed for a store
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Open the event stream for `store_id`
    async fn open(&self, store_id: &str) -> Result<EventStream, TransportError>;

    /// Fetch the whole summary in one response
    async fn snapshot(&self, store_id: &str) -> Result<SnapshotPayload, TransportError>;
}

/// Answers free-text instructions the local parser does not handle
#[async_trait::async_trait]
pub trait InstructionProvider: Send + Sync {
    /// Run one instruction with its conversation context
    async fn instruct(
        &self,
        request: InstructionRequest,
    ) -> Result<InstructionResponse, TransportError>;
}

/// Receives narration text to be spoken
#[async_trait::async_trait]
pub trait SpeechSink: Send + Sync {
    /// Speak `text` for `store_id`
    async fn speak(&self, store_id: &str, text: &str) -> Result<(), TransportError>;
}

/// Sink that writes narration to the log instead of producing audio
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeech;

#[async_trait::async_trait]
impl SpeechSink for LogSpeech {
    async fn speak(&self, store_id: &str, text: &str) -> Result<(), TransportError> {
        tracing::info!(store = %store_id, %text, "Narration");
        Ok(())
    }
}
