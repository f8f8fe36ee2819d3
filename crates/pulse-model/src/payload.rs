//! Provider payloads
//!
//! Shapes exchanged with the recommendation provider. The streamed events
//! carry slices of [`SnapshotPayload`]; the instruction intake exchanges
//! [`InstructionRequest`] / [`InstructionResponse`].
//!
//! Narration and action lists decode per record: a record that fails to
//! decode or validate is logged and dropped, the rest of the batch is kept.

use crate::action::Action;
use crate::conversation::{ConversationSnippet, NarrationEntry};
use crate::error::PayloadError;
use crate::store::{CategorySummary, SkuRow, StoreMeta};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Body of the `meta` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub store: StoreMeta,
}

/// Full one-shot snapshot for a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    pub store: StoreMeta,
    #[serde(default)]
    pub categories: Vec<CategorySummary>,
    #[serde(default)]
    pub sku_performance: Vec<SkuRow>,
    #[serde(default, deserialize_with = "valid_narration")]
    pub narration: Vec<NarrationEntry>,
    #[serde(default, deserialize_with = "valid_actions")]
    pub actions: Vec<Action>,
}

impl SnapshotPayload {
    /// The `meta` slice of this snapshot
    #[must_use]
    pub fn meta(&self) -> MetaPayload {
        MetaPayload {
            generated_at: self.generated_at,
            store: self.store.clone(),
        }
    }

    /// Narration sorted by server order; entries without one keep their
    /// position after the ordered ones
    #[must_use]
    pub fn ordered_narration(&self) -> Vec<NarrationEntry> {
        let mut narration = self.narration.clone();
        narration.sort_by_key(|n| n.order.unwrap_or(u32::MAX));
        narration
    }
}

/// Free-text instruction forwarded to the instruction provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionRequest {
    pub store_id: String,
    pub instruction: String,
    pub conversation: Vec<ConversationSnippet>,
}

/// Provider answer to an instruction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionResponse {
    #[serde(default, deserialize_with = "valid_narration")]
    pub narration: Vec<NarrationEntry>,
    #[serde(default, deserialize_with = "valid_actions")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_summary: Option<String>,
}

fn keep_valid<'de, D, T>(
    deserializer: D,
    record: &'static str,
    check: fn(&T) -> Result<(), PayloadError>,
) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| {
            let decoded = serde_json::from_value::<T>(value)
                .map_err(|err| PayloadError::malformed(record, err))
                .and_then(|item| check(&item).map(|()| item));
            match decoded {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!(record, error = %err, "Dropping invalid record from batch");
                    None
                }
            }
        })
        .collect())
}

fn valid_narration<'de, D>(deserializer: D) -> Result<Vec<NarrationEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    keep_valid(deserializer, "narration", NarrationEntry::validate)
}

fn valid_actions<'de, D>(deserializer: D) -> Result<Vec<Action>, D::Error>
where
    D: Deserializer<'de>,
{
    keep_valid(deserializer, "action", Action::validate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn action_json(id: &str) -> serde_json::Value {
        json!({
            "id": id, "title": "Rebalance", "summary": "Move space",
            "severity": "high", "type": "rebalance", "shiftPct": 8,
            "sourceCategory": "Batteries", "targetCategory": "Lighting"
        })
    }

    #[test]
    fn snapshot_narration_sorted_by_order() {
        let snapshot: SnapshotPayload = serde_json::from_value(serde_json::json!({
            "generatedAt": "2025-03-01T12:00:00Z",
            "store": {
                "id": "ATL_050", "capacityPct": 1.05, "inventoryHealth": 75,
                "totals": {"onHand": 10000, "skuCount": 40}
            },
            "narration": [
                {"id": "c", "text": "third"},
                {"id": "b", "order": 2, "text": "second"},
                {"id": "a", "order": 1, "text": "first"}
            ]
        }))
        .unwrap();

        let ids: Vec<_> = snapshot
            .ordered_narration()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(snapshot.actions.is_empty());
        assert_eq!(snapshot.meta().store.id, "ATL_050");
    }

    #[test]
    fn one_bad_record_does_not_sink_the_batch() {
        let snapshot: SnapshotPayload = serde_json::from_value(json!({
            "store": {
                "id": "ATL_050", "capacityPct": 1.05, "inventoryHealth": 75,
                "totals": {"onHand": 10000, "skuCount": 40}
            },
            "narration": [
                {"id": "overview", "order": 1, "text": "Capacity is running hot."},
                {"id": "blank", "order": 2, "text": "  "}
            ],
            "actions": [
                action_json("act-1"),
                {"id": "act-2", "severity": "low", "type": "rebalance", "shiftPct": 5,
                 "sourceCategory": "Brakes", "targetCategory": "Wipers"},
                {"id": "act-3", "title": "Too far", "summary": "", "severity": "low",
                 "type": "rebalance", "shiftPct": 140,
                 "sourceCategory": "Brakes", "targetCategory": "Wipers"}
            ]
        }))
        .unwrap();

        let actions: Vec<_> = snapshot.actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(actions, vec!["act-1"]);
        let narration: Vec<_> = snapshot.narration.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(narration, vec!["overview"]);
    }

    #[test]
    fn instruction_response_keeps_good_actions() {
        let response: InstructionResponse = serde_json::from_value(json!({
            "narration": [{"id": "", "text": "Shifting wipers forward."}],
            "actions": [{"id": "broken"}, action_json("act-9")]
        }))
        .unwrap();

        assert_eq!(response.actions.len(), 1);
        assert_eq!(response.actions[0].id, "act-9");
        assert_eq!(response.narration.len(), 1);
        assert_eq!(response.voice_summary, None);
    }

    #[test]
    fn batch_must_still_be_a_list() {
        let err = serde_json::from_value::<InstructionResponse>(json!({"actions": {"id": "x"}}));
        assert!(err.is_err());
    }
}
