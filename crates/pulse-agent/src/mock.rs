//! Deterministic mock recommendation provider
//!
//! Builds a store summary from bundled reference data and derives two
//! rebalancing actions from it:
//! - the two heaviest categories are paired with the two lightest
//! - `shiftPct = max(3, round(gap * 100 * 0.6))`
//! - up to three weakest SKUs of the heavy category are proposed for removal
//! - three restock entries are proposed for the light category
//!
//! The same summary is served as an event stream, optionally paced, and as
//! a one-shot snapshot.

use crate::event::{FeedEvent, RawEvent};
use crate::source::{EventStream, FeedSource, InstructionProvider};
use chrono::Utc;
use futures::StreamExt;
use pulse_core::{TransportError, DEFAULT_STORE_ID};
use pulse_model::{
    inventory_health, Action, AddCandidate, CategorySummary, InstructionRequest,
    InstructionResponse, NarrationEntry, PayloadError, RemoveCandidate, Severity, SkuRow,
    SnapshotPayload, StoreMeta, StoreTotals, Tone,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const STORES_JSON: &str = include_str!("../data/stores.json");
const TOTALS_JSON: &str = include_str!("../data/totals.json");
const CATEGORIES_JSON: &str = include_str!("../data/categories.json");
const SKUS_JSON: &str = include_str!("../data/sku_performance.json");

const PAIRED_CATEGORIES: usize = 2;
const MAX_REMOVE: usize = 3;
const RESTOCK_COUNT: u32 = 3;
const MIN_SHIFT_PCT: f64 = 3.0;
const SHIFT_DAMPING: f64 = 0.6;

/// Store directory entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockStore {
    pub id: String,
    pub name: String,
    pub region: String,
    pub status: String,
    pub capacity_pct: f64,
    #[serde(default)]
    pub returns_pending: u32,
}

/// Mock provider backed by bundled data
#[derive(Debug, Clone)]
pub struct MockFeed {
    stores: Vec<MockStore>,
    totals: HashMap<String, StoreTotals>,
    categories: Vec<CategorySummary>,
    skus: Vec<SkuRow>,
    event_delay: Duration,
}

impl MockFeed {
    /// Mock feed over the bundled reference data
    ///
    /// # Errors
    /// Returns [`PayloadError::Malformed`] if the bundled data does not decode
    pub fn bundled() -> Result<Self, PayloadError> {
        Self::from_json(STORES_JSON, TOTALS_JSON, CATEGORIES_JSON, SKUS_JSON)
    }

    /// Mock feed over caller-supplied JSON documents
    ///
    /// # Errors
    /// Returns [`PayloadError::Malformed`] naming the document that failed
    pub fn from_json(
        stores: &str,
        totals: &str,
        categories: &str,
        skus: &str,
    ) -> Result<Self, PayloadError> {
        Ok(Self {
            stores: serde_json::from_str(stores)
                .map_err(|err| PayloadError::malformed("stores", err))?,
            totals: serde_json::from_str(totals)
                .map_err(|err| PayloadError::malformed("totals", err))?,
            categories: serde_json::from_str(categories)
                .map_err(|err| PayloadError::malformed("categories", err))?,
            skus: serde_json::from_str(skus)
                .map_err(|err| PayloadError::malformed("skuPerformance", err))?,
            event_delay: Duration::ZERO,
        })
    }

    /// Pause `delay` between streamed events
    #[must_use]
    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = delay;
        self
    }

    /// Known store ids
    pub fn store_ids(&self) -> impl Iterator<Item = &str> {
        self.stores.iter().map(|s| s.id.as_str())
    }

    /// Store for `store_id`, case-insensitive; unknown ids get the default
    /// store
    #[must_use]
    pub fn find_store(&self, store_id: &str) -> Option<&MockStore> {
        let wanted = store_id.to_uppercase();
        self.stores
            .iter()
            .find(|s| s.id == wanted)
            .or_else(|| self.stores.iter().find(|s| s.id == DEFAULT_STORE_ID))
            .or_else(|| self.stores.first())
    }

    /// Full summary for `store_id`
    ///
    /// # Errors
    /// Returns [`TransportError::Fetch`] when the directory has no stores
    pub fn summary(&self, store_id: &str) -> Result<SnapshotPayload, TransportError> {
        let store = self
            .find_store(store_id)
            .ok_or_else(|| TransportError::Fetch(format!("no store data for {store_id}")))?;

        let totals = self.totals.get(&store.id).cloned().unwrap_or(StoreTotals {
            on_hand: 0,
            sku_count: 0,
            capacity_pct: Some(store.capacity_pct),
        });
        let capacity_pct = totals.capacity_pct.unwrap_or(store.capacity_pct);
        let health = inventory_health(capacity_pct);

        let actions = self.actions(store, capacity_pct);
        let narration = narration(store, capacity_pct, health, &actions);

        Ok(SnapshotPayload {
            generated_at: Some(Utc::now()),
            store: StoreMeta {
                id: store.id.clone(),
                name: Some(store.name.clone()),
                region: Some(store.region.clone()),
                status: Some(store.status.clone()),
                capacity_pct,
                inventory_health: health,
                totals,
            },
            categories: self.categories.clone(),
            sku_performance: self.skus.clone(),
            narration,
            actions,
        })
    }

    fn actions(&self, store: &MockStore, capacity_pct: f64) -> Vec<Action> {
        let mut sorted = self.categories.clone();
        sorted.sort_by(|a, b| b.pct.total_cmp(&a.pct));
        let light = &sorted[sorted.len().saturating_sub(PAIRED_CATEGORIES)..];

        sorted
            .iter()
            .take(PAIRED_CATEGORIES)
            .enumerate()
            .map(|(index, heavy)| {
                let counterpart = counterpart(heavy, light, index);
                self.rebalance(store, capacity_pct, index, heavy, counterpart)
            })
            .collect()
    }

    fn rebalance(
        &self,
        store: &MockStore,
        capacity_pct: f64,
        index: usize,
        heavy: &CategorySummary,
        counterpart: &CategorySummary,
    ) -> Action {
        let gap = (heavy.pct - counterpart.pct).max(0.0);
        let shift_pct = (gap * 100.0 * SHIFT_DAMPING).round().max(MIN_SHIFT_PCT);

        let mut weakest: Vec<&SkuRow> =
            self.skus.iter().filter(|sku| sku.category == heavy.name).collect();
        weakest.sort_by_key(|sku| sku.ranking);
        let remove = weakest
            .into_iter()
            .take(MAX_REMOVE)
            .map(|sku| RemoveCandidate {
                id: sku.id.clone(),
                name: sku.name.clone(),
                reason: sku.reason.clone(),
                ranking: sku.ranking,
                capacity_pct: (sku.capacity_pct * 100.0).round(),
            })
            .collect();

        let prefix = counterpart
            .name
            .chars()
            .take(3)
            .collect::<String>()
            .to_uppercase();
        let headroom = (counterpart.pct * 100.0 / capacity_pct.max(1.0)).round();
        let add = (1..=RESTOCK_COUNT)
            .map(|i| AddCandidate {
                id: format!("{prefix}-RESTOCK-{i}"),
                name: format!("{} replenishment {i}", counterpart.name),
                fit_score: 93.0 - 5.0 * f64::from(i - 1),
                rationale: format!(
                    "High turn potential in {} bays with {headroom}% allocation headroom.",
                    counterpart.name.to_lowercase()
                ),
            })
            .collect();

        let severity = if index == 0 && (capacity_pct > 1.08 || gap > 0.08) {
            Severity::High
        } else if gap > 0.05 {
            Severity::Medium
        } else {
            Severity::Low
        };

        Action {
            id: format!("action-{}-{}", store.id.to_lowercase(), index + 1),
            title: format!("Rebalance {} into {}", heavy.name, counterpart.name),
            summary: format!(
                "Reclaim approximately {shift_pct}% of bay space from {} (currently {}%) and reallocate to {} to tighten cycle time.",
                heavy.name,
                (heavy.pct * 100.0).round(),
                counterpart.name
            ),
            voice_summary: None,
            severity,
            kind: "rebalance".into(),
            shift_pct,
            source_category: heavy.name.clone(),
            target_category: counterpart.name.clone(),
            remove,
            add,
        }
    }
}

/// Light category paired with the `index`-th heavy one
fn counterpart<'a>(
    heavy: &'a CategorySummary,
    light: &'a [CategorySummary],
    index: usize,
) -> &'a CategorySummary {
    let fallback = light
        .get(light.len().saturating_sub(1).saturating_sub(index))
        .unwrap_or(heavy);
    if fallback.name == heavy.name {
        light.get(index % light.len().max(1)).unwrap_or(heavy)
    } else {
        fallback
    }
}

fn narration(
    store: &MockStore,
    capacity_pct: f64,
    health: u8,
    actions: &[Action],
) -> Vec<NarrationEntry> {
    let mut entries = vec![
        NarrationEntry {
            id: "overview".into(),
            order: Some(1),
            tone: Some(if capacity_pct > 1.0 { Tone::Alert } else { Tone::Calm }),
            text: format!(
                "Inventory health for {} is {health} with capacity running at {}%.",
                store.name,
                (capacity_pct * 100.0).round()
            ),
            action_id: None,
        },
        NarrationEntry {
            id: "returns".into(),
            order: Some(2),
            tone: Some(if store.returns_pending > 3 {
                Tone::Alert
            } else {
                Tone::Neutral
            }),
            text: format!(
                "{} returns are pending; keep the dock clear to avoid compounding bay pressure.",
                store.returns_pending
            ),
            action_id: None,
        },
    ];

    entries.extend(actions.iter().zip(3u32..).enumerate().map(|(idx, (action, order))| {
        let example = action
            .remove
            .first()
            .map_or("current low performers", |r| r.name.as_str());
        NarrationEntry {
            id: format!("action-{}", idx + 1),
            order: Some(order),
            tone: Some(if idx == 0 { Tone::Directive } else { Tone::Suggestion }),
            text: format!(
                "Recommend shifting about {}% from {} into {} and staging removal of slow SKUs like {example}.",
                action.shift_pct, action.source_category, action.target_category
            ),
            action_id: Some(action.id.clone()),
        }
    }));
    entries
}

#[async_trait::async_trait]
impl FeedSource for MockFeed {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open(&self, store_id: &str) -> Result<EventStream, TransportError> {
        let summary = self.summary(store_id)?;
        let frames = FeedEvent::sequence(&summary)
            .iter()
            .map(FeedEvent::encode)
            .collect::<Result<Vec<RawEvent>, _>>()
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        let delay = self.event_delay;
        let stream = futures::stream::iter(frames.into_iter().enumerate()).then(
            move |(i, frame)| async move {
                if i > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, TransportError>(frame)
            },
        );
        Ok(stream.boxed())
    }

    async fn snapshot(&self, store_id: &str) -> Result<SnapshotPayload, TransportError> {
        self.summary(store_id)
    }
}

#[async_trait::async_trait]
impl InstructionProvider for MockFeed {
    async fn instruct(
        &self,
        request: InstructionRequest,
    ) -> Result<InstructionResponse, TransportError> {
        let summary = self
            .summary(&request.store_id)
            .map_err(|err| TransportError::Provider(err.to_string()))?;

        let mut narration = vec![NarrationEntry {
            id: String::new(),
            order: Some(1),
            tone: Some(Tone::Neutral),
            text: format!(
                "Reviewed \"{}\" against {}.",
                request.instruction.trim(),
                summary.store.label()
            ),
            action_id: None,
        }];
        narration.extend(
            summary
                .narration
                .into_iter()
                .filter(|entry| entry.action_id.is_some())
                .map(|entry| NarrationEntry {
                    id: String::new(),
                    ..entry
                }),
        );

        Ok(InstructionResponse {
            narration,
            actions: summary.actions,
            voice_summary: None,
        })
    }
}
