//! Stream event schema
//!
//! The feed delivers named events whose bodies are JSON slices of a
//! snapshot. Each name maps to one [`FeedEvent`] variant; anything else is
//! a [`PayloadError`] and gets dropped without closing the stream.

use pulse_core::Command;
use pulse_model::{
    Action, CategorySummary, MetaPayload, NarrationEntry, PayloadError, SkuRow, SnapshotPayload,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Event as framed by the transport: a name and an undecoded body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub name: String,
    pub data: String,
}

impl RawEvent {
    /// Create new raw event
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Body of the closing `complete` event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteBody {
    #[serde(default)]
    pub message: String,
}

/// Decoded and validated feed event
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Meta(MetaPayload),
    Categories(Vec<CategorySummary>),
    SkuPerformance(Vec<SkuRow>),
    Narration(NarrationEntry),
    Action(Action),
    Complete,
}

impl FeedEvent {
    /// Wire name of this event
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Meta(_) => "meta",
            Self::Categories(_) => "categories",
            Self::SkuPerformance(_) => "skuPerformance",
            Self::Narration(_) => "narration",
            Self::Action(_) => "action",
            Self::Complete => "complete",
        }
    }

    /// True for the closing event
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Decode and validate `raw`
    ///
    /// # Errors
    /// Returns [`PayloadError::UnknownEvent`] for a name outside the schema,
    /// [`PayloadError::Malformed`] for an undecodable body, or the record's
    /// validation error
    pub fn decode(raw: &RawEvent) -> Result<Self, PayloadError> {
        let event = match raw.name.as_str() {
            "meta" => {
                let meta: MetaPayload = body(raw)?;
                if meta.store.id.trim().is_empty() {
                    return Err(PayloadError::MissingField {
                        record: "meta",
                        field: "store.id",
                    });
                }
                Self::Meta(meta)
            }
            "categories" => Self::Categories(body(raw)?),
            "skuPerformance" => Self::SkuPerformance(body(raw)?),
            "narration" => {
                let entry: NarrationEntry = body(raw)?;
                entry.validate()?;
                Self::Narration(entry)
            }
            "action" => {
                let action: Action = body(raw)?;
                action.validate()?;
                Self::Action(action)
            }
            "complete" => {
                // Body is informational only
                if !raw.data.trim().is_empty() {
                    let _: CompleteBody = body(raw)?;
                }
                Self::Complete
            }
            other => return Err(PayloadError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }

    /// Encode back into a transport frame
    ///
    /// # Errors
    /// Returns the encoder error
    pub fn encode(&self) -> Result<RawEvent, serde_json::Error> {
        let data = match self {
            Self::Meta(meta) => serde_json::to_string(meta)?,
            Self::Categories(categories) => serde_json::to_string(categories)?,
            Self::SkuPerformance(rows) => serde_json::to_string(rows)?,
            Self::Narration(entry) => serde_json::to_string(entry)?,
            Self::Action(action) => serde_json::to_string(action)?,
            Self::Complete => serde_json::to_string(&CompleteBody {
                message: "stream-end".into(),
            })?,
        };
        Ok(RawEvent::new(self.name(), data))
    }

    /// Reducer command for this event
    #[must_use]
    pub fn into_command(self) -> Command {
        match self {
            Self::Meta(meta) => Command::IngestMeta(meta),
            Self::Categories(categories) => Command::IngestCategories(categories),
            Self::SkuPerformance(rows) => Command::IngestSkuPerformance(rows),
            Self::Narration(entry) => Command::IngestNarration(vec![entry]),
            Self::Action(action) => Command::IngestAction(action),
            Self::Complete => Command::Complete,
        }
    }

    /// Events a stream would carry for `snapshot`, in protocol order
    #[must_use]
    pub fn sequence(snapshot: &SnapshotPayload) -> Vec<Self> {
        let mut events = vec![
            Self::Meta(snapshot.meta()),
            Self::Categories(snapshot.categories.clone()),
            Self::SkuPerformance(snapshot.sku_performance.clone()),
        ];
        events.extend(snapshot.ordered_narration().into_iter().map(Self::Narration));
        events.extend(snapshot.actions.iter().cloned().map(Self::Action));
        events.push(Self::Complete);
        events
    }
}

fn body<T: DeserializeOwned>(raw: &RawEvent) -> Result<T, PayloadError> {
    serde_json::from_str(&raw.data).map_err(|err| PayloadError::malformed(raw.name.as_str(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_known_events() {
        let raw = RawEvent::new(
            "action",
            r#"{"id":"a-1","title":"Rebalance","summary":"s","severity":"high","type":"rebalance",
                "shiftPct":7,"sourceCategory":"Batteries","targetCategory":"Lighting"}"#,
        );
        let FeedEvent::Action(action) = FeedEvent::decode(&raw).unwrap() else {
            panic!("expected action");
        };
        assert_eq!(action.id, "a-1");
        assert!(action.remove.is_empty());

        let categories = RawEvent::new("categories", r#"[{"name":"Brakes","pct":0.3}]"#);
        assert_eq!(
            FeedEvent::decode(&categories).unwrap(),
            FeedEvent::Categories(vec![CategorySummary::new("Brakes", 0.3)])
        );

        let complete = RawEvent::new("complete", r#"{"message":"stream-end"}"#);
        assert!(FeedEvent::decode(&complete).unwrap().is_complete());
    }

    #[test]
    fn unknown_event_is_rejected() {
        let raw = RawEvent::new("heartbeat", "{}");
        assert!(matches!(
            FeedEvent::decode(&raw),
            Err(PayloadError::UnknownEvent(name)) if name == "heartbeat"
        ));
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        let truncated = RawEvent::new("narration", r#"{"id":"n-1","text":"#);
        assert!(matches!(
            FeedEvent::decode(&truncated),
            Err(PayloadError::Malformed { .. })
        ));

        let blank_text = RawEvent::new("narration", r#"{"id":"n-1","text":"  "}"#);
        assert!(matches!(
            FeedEvent::decode(&blank_text),
            Err(PayloadError::MissingField { .. })
        ));

        let bad_shift = RawEvent::new(
            "action",
            r#"{"id":"a-1","title":"t","summary":"s","severity":"low","type":"rebalance",
                "shiftPct":250,"sourceCategory":"A","targetCategory":"B"}"#,
        );
        assert!(matches!(
            FeedEvent::decode(&bad_shift),
            Err(PayloadError::OutOfRange { .. })
        ));
    }

    #[test]
    fn encoded_event_decodes_to_itself() {
        let event = FeedEvent::Narration(NarrationEntry {
            id: "overview".into(),
            order: Some(1),
            tone: None,
            text: "Capacity is high.".into(),
            action_id: None,
        });
        let raw = event.encode().unwrap();
        assert_eq!(raw.name, "narration");
        assert_eq!(FeedEvent::decode(&raw).unwrap(), event);
    }
}
