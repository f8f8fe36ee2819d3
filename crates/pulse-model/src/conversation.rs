//! Narration and conversation records

use crate::error::PayloadError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Generate an id for a message that arrived without one
#[inline]
#[must_use]
pub fn new_message_id() -> String {
    format!("msg-{}", Ulid::new().to_string().to_lowercase())
}

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    User,
    System,
}

/// Delivery tone of a narration step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Alert,
    Calm,
    Neutral,
    Directive,
    Suggestion,
}

/// One narration step as emitted by the recommendation provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationEntry {
    /// Server id; blank means "generate one"
    #[serde(default)]
    pub id: String,
    /// Server-declared position, used as the display tie-break
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
}

impl NarrationEntry {
    /// Check the fields a decoded provider record must carry
    ///
    /// # Errors
    /// Returns [`PayloadError::MissingField`] when the text is blank
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.text.trim().is_empty() {
            return Err(PayloadError::MissingField {
                record: "narration",
                field: "text",
            });
        }
        Ok(())
    }
}

/// A stored conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// Unique id, used for de-duplication
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl ConversationMessage {
    /// Create message with a generated id
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: new_message_id(),
            role,
            text: text.into(),
            timestamp,
            action_id: None,
            tone: None,
            order: None,
        }
    }

    /// Agent message from a narration step; a blank id is replaced
    #[must_use]
    pub fn from_narration(entry: NarrationEntry, timestamp: DateTime<Utc>) -> Self {
        let id = if entry.id.trim().is_empty() {
            new_message_id()
        } else {
            entry.id
        };
        Self {
            id,
            role: Role::Agent,
            text: entry.text,
            timestamp,
            action_id: entry.action_id,
            tone: entry.tone,
            order: entry.order,
        }
    }

    /// With explicit id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// With related action
    #[inline]
    #[must_use]
    pub fn with_action(mut self, action_id: impl Into<String>) -> Self {
        self.action_id = Some(action_id.into());
        self
    }

    /// Snippet forwarded to an instruction provider
    #[inline]
    #[must_use]
    pub fn snippet(&self) -> ConversationSnippet {
        ConversationSnippet {
            role: self.role,
            text: self.text.clone(),
        }
    }
}

/// Role and text only, as forwarded to an instruction provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnippet {
    pub role: Role,
    pub text: String,
}
