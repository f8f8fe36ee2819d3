//! Testing utilities for the Pulse workspace
//!
//! Shared fixtures, scripted feed sources and recording collaborators.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use futures::StreamExt;
use parking_lot::Mutex;
use pulse_agent::{EventStream, FeedEvent, FeedSource, InstructionProvider, RawEvent, SpeechSink};
use pulse_core::{CopilotStore, PulseConfig, TransportError};
use pulse_model::{
    Action, Baseline, CategoryMix, CategorySummary, InstructionRequest, InstructionResponse,
    NarrationEntry, Severity, SkuRow, SnapshotPayload, StoreMeta, StoreTotals,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub fn fixed_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_740_000_000, 0).unwrap()
}

pub fn shared_store() -> Arc<CopilotStore> {
    CopilotStore::shared(PulseConfig::default())
}

pub fn store_meta(id: &str, capacity_pct: f64, on_hand: u64) -> StoreMeta {
    StoreMeta {
        id: id.to_string(),
        name: Some(format!("Test {id}")),
        region: Some("Test".into()),
        status: None,
        capacity_pct,
        inventory_health: pulse_model::inventory_health(capacity_pct),
        totals: StoreTotals {
            on_hand,
            sku_count: 3,
            capacity_pct: Some(capacity_pct),
        },
    }
}

pub fn sample_categories() -> Vec<CategorySummary> {
    vec![
        CategorySummary::new("Batteries", 0.6),
        CategorySummary::new("Wipers", 0.4),
    ]
}

pub fn sample_skus() -> Vec<SkuRow> {
    vec![
        SkuRow {
            id: "BAT-1".into(),
            name: "Marine battery".into(),
            category: "Batteries".into(),
            on_hand: 40,
            weekly_sales: 0.5,
            capacity_pct: 0.03,
            reason: "Seasonal".into(),
            ranking: 1,
        },
        SkuRow {
            id: "WPR-1".into(),
            name: "Beam blade".into(),
            category: "Wipers".into(),
            on_hand: 90,
            weekly_sales: 6.0,
            capacity_pct: 0.01,
            reason: "Fast mover".into(),
            ranking: 8,
        },
    ]
}

pub fn sample_baseline() -> Baseline {
    Baseline::new(
        CategoryMix::from_summaries(&sample_categories()),
        1.05,
        10_000,
        sample_skus(),
    )
}

pub fn sample_action(id: &str, shift_pct: f64) -> Action {
    Action {
        id: id.to_string(),
        title: format!("Rebalance Batteries into Wipers ({id})"),
        summary: "Move bay space from Batteries to Wipers.".into(),
        voice_summary: None,
        severity: Severity::High,
        kind: "rebalance".into(),
        shift_pct,
        source_category: "Batteries".into(),
        target_category: "Wipers".into(),
        remove: Vec::new(),
        add: Vec::new(),
    }
}

pub fn sample_narration(id: &str, order: u32, text: &str) -> NarrationEntry {
    NarrationEntry {
        id: id.to_string(),
        order: Some(order),
        tone: None,
        text: text.to_string(),
        action_id: None,
    }
}

pub fn sample_snapshot(store_id: &str) -> SnapshotPayload {
    SnapshotPayload {
        generated_at: Some(fixed_time()),
        store: store_meta(store_id, 1.05, 10_000),
        categories: sample_categories(),
        sku_performance: sample_skus(),
        narration: vec![
            sample_narration("overview", 1, "Capacity is running hot."),
            sample_narration("returns", 2, "Two returns are pending."),
        ],
        actions: vec![sample_action("act-1", 10.0), sample_action("act-2", 4.0)],
    }
}

/// Frames a stream would carry for `snapshot`
pub fn frames(snapshot: &SnapshotPayload) -> Vec<RawEvent> {
    FeedEvent::sequence(snapshot)
        .iter()
        .map(|event| event.encode().unwrap())
        .collect()
}

/// Canned behaviour of [`ScriptedFeed`] for one store
#[derive(Debug, Clone)]
pub struct Script {
    pub open_error: Option<TransportError>,
    pub events: Vec<Result<RawEvent, TransportError>>,
    /// Keep the stream open forever after the scripted events
    pub hang: bool,
    pub snapshot: Result<SnapshotPayload, TransportError>,
}

impl Script {
    /// Stream that delivers `snapshot` in full
    pub fn complete(snapshot: SnapshotPayload) -> Self {
        Self {
            open_error: None,
            events: frames(&snapshot).into_iter().map(Ok).collect(),
            hang: false,
            snapshot: Ok(snapshot),
        }
    }

    pub fn with_events(mut self, events: Vec<Result<RawEvent, TransportError>>) -> Self {
        self.events = events;
        self
    }

    pub fn with_open_error(mut self, err: TransportError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub fn with_snapshot(mut self, snapshot: Result<SnapshotPayload, TransportError>) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }
}

/// Feed source replaying per-store scripts
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    scripts: HashMap<String, Script>,
    opens: AtomicUsize,
    snapshots: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, store_id: &str, script: Script) -> Self {
        self.scripts.insert(store_id.to_string(), script);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    fn script(&self, store_id: &str) -> Result<&Script, TransportError> {
        self.scripts
            .get(store_id)
            .ok_or_else(|| TransportError::Connect(format!("no script for {store_id}")))
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedFeed {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, store_id: &str) -> Result<EventStream, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let script = self.script(store_id)?;
        if let Some(err) = &script.open_error {
            return Err(err.clone());
        }
        let events = futures::stream::iter(script.events.clone());
        if script.hang {
            Ok(events.chain(futures::stream::pending()).boxed())
        } else {
            Ok(events.boxed())
        }
    }

    async fn snapshot(&self, store_id: &str) -> Result<SnapshotPayload, TransportError> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.script(store_id)?.snapshot.clone()
    }
}

/// Instruction provider returning a canned answer and keeping every request
#[derive(Debug)]
pub struct RecordingProvider {
    response: Result<InstructionResponse, TransportError>,
    requests: Mutex<Vec<InstructionRequest>>,
}

impl RecordingProvider {
    pub fn answering(response: InstructionResponse) -> Self {
        Self {
            response: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: TransportError) -> Self {
        Self {
            response: Err(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<InstructionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl InstructionProvider for RecordingProvider {
    async fn instruct(
        &self,
        request: InstructionRequest,
    ) -> Result<InstructionResponse, TransportError> {
        self.requests.lock().push(request);
        self.response.clone()
    }
}

/// Speech sink forwarding spoken text to a channel
#[derive(Debug)]
pub struct RecordingSpeech {
    tx: mpsc::UnboundedSender<String>,
    fail: bool,
}

impl RecordingSpeech {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: false }, rx)
    }

    /// Sink that records the text and then reports a failure
    pub fn failing() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: true }, rx)
    }
}

#[async_trait::async_trait]
impl SpeechSink for RecordingSpeech {
    async fn speak(&self, _store_id: &str, text: &str) -> Result<(), TransportError> {
        let _ = self.tx.send(text.to_string());
        if self.fail {
            return Err(TransportError::Speech("no audio device".into()));
        }
        Ok(())
    }
}
