//! Conversation log
//!
//! Append-only and de-duplicated by message id. Storage is unbounded; the
//! display window is applied on read.

use chrono::{DateTime, Utc};
use pulse_model::{ConversationMessage, ConversationSnippet, NarrationEntry, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, de-duplicated message log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ConversationMessage>", into = "Vec<ConversationMessage>")]
pub struct ConversationLog {
    messages: Vec<ConversationMessage>,
    seen: HashSet<String>,
}

impl ConversationLog {
    /// Create empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message`; a known id is dropped and `false` returned
    pub fn append(&mut self, message: ConversationMessage) -> bool {
        if !self.seen.insert(message.id.clone()) {
            tracing::trace!(id = %message.id, "Duplicate message dropped");
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Append narration entries as agent messages sharing `timestamp`
    ///
    /// Entries are sorted by server order first. Returns how many were new.
    pub fn append_narration(
        &mut self,
        mut entries: Vec<NarrationEntry>,
        timestamp: DateTime<Utc>,
    ) -> usize {
        entries.sort_by_key(|e| e.order.unwrap_or(u32::MAX));
        entries
            .into_iter()
            .map(|e| self.append(ConversationMessage::from_narration(e, timestamp)))
            .filter(|added| *added)
            .count()
    }

    /// Every stored message in arrival order
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Number of stored messages
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing has been appended
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Last `window` messages for display
    ///
    /// Sorted by timestamp with the server order as tie-break; messages
    /// without an order keep arrival order after ordered ones.
    #[must_use]
    pub fn recent(&self, window: usize) -> Vec<&ConversationMessage> {
        let start = self.messages.len().saturating_sub(window);
        let mut view: Vec<&ConversationMessage> = self.messages[start..].iter().collect();
        view.sort_by_key(|m| (m.timestamp, m.order.unwrap_or(u32::MAX)));
        view
    }

    /// Last `count` messages as provider snippets
    #[must_use]
    pub fn snippets(&self, count: usize) -> Vec<ConversationSnippet> {
        let start = self.messages.len().saturating_sub(count);
        self.messages[start..]
            .iter()
            .map(ConversationMessage::snippet)
            .collect()
    }

    /// First agent message, if any
    #[must_use]
    pub fn first_agent_message(&self) -> Option<&ConversationMessage> {
        self.messages.iter().find(|m| m.role == Role::Agent)
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.messages.clear();
        self.seen.clear();
    }
}

impl From<Vec<ConversationMessage>> for ConversationLog {
    fn from(messages: Vec<ConversationMessage>) -> Self {
        let mut log = Self::new();
        for message in messages {
            log.append(message);
        }
        log
    }
}

impl From<ConversationLog> for Vec<ConversationMessage> {
    fn from(log: ConversationLog) -> Self {
        log.messages
    }
}
