//! Session state and reducer
//!
//! All mutations of a store session go through [`reduce`]: one
//! [`Command`] in, one [`Outcome`] out. Steady-state conditions such as a
//! missing baseline or a repeated apply come back as [`Outcome::Ignored`]
//! and never as errors.

use crate::catalog::{ActionCatalog, Upsert};
use crate::config::PulseConfig;
use crate::conversation::ConversationLog;
use crate::error::LifecycleError;
use crate::intent::Intent;
use crate::lifecycle::validate_transition;
use crate::synthesis::{synthesize, SynthesisIntent};
use chrono::{DateTime, Utc};
use pulse_ledger::{AdjustmentEngine, ApplyOutcome, EffectiveSummary, OverrideLedger};
use pulse_model::{
    Action, ActionStatus, Baseline, CategorySummary, ConversationMessage, MetaPayload,
    NarrationEntry, Role, SkuRow, SnapshotPayload, StoreMeta,
};
use pulse_scenario::{ScenarioError, ScenarioKpis, ScenarioPatch, ScenarioPreset, WhatIfSession};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Feed status shown to the operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    /// No session
    #[default]
    Idle,
    /// Session open, events arriving
    Listening,
    /// Feed or fallback delivered a full summary
    Complete,
    /// Feed and fallback both failed
    Error,
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Complete => "complete",
            Self::Error => "error",
        })
    }
}

/// Everything that can change a session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Clear the session and start listening for `store_id`
    BeginSession { store_id: String },
    /// Clear the session and go idle
    EndSession,
    /// Store identity and metrics
    IngestMeta(MetaPayload),
    /// Replace the category reference context
    IngestCategories(Vec<CategorySummary>),
    /// Replace the SKU reference context
    IngestSkuPerformance(Vec<SkuRow>),
    /// Narration entries sharing one arrival time
    IngestNarration(Vec<NarrationEntry>),
    /// One recommended action
    IngestAction(Action),
    /// A whole snapshot as one batch
    IngestSnapshot(SnapshotPayload),
    /// Feed finished
    Complete,
    /// Feed and fallback both failed
    FeedFailed { reason: String },
    /// Seed the baseline explicitly
    SetBaseline(Baseline),
    /// Open an action for review
    OpenReview { action_id: String },
    /// Close a review without deciding
    CloseReview { action_id: String },
    /// Reject an action
    Dismiss { action_id: String },
    /// Commit an action to the ledger
    Apply { action_id: String },
    /// Drop an action from the live catalog
    RemoveAction { action_id: String },
    /// Point effective capacity at a percentage
    SetTargetCapacity { pct: f64 },
    /// Clear the override ledger
    ResetOverrides,
    /// Append a conversation message
    AppendMessage(ConversationMessage),
    /// Build an action from the SKU rows of a category
    SynthesizeAction {
        category: String,
        intent: SynthesisIntent,
    },
    /// Run a locally parsed intent
    RunIntent(Intent),
    /// Turn projection mode on
    ActivateWhatIf,
    /// Merge scenario knobs
    UpdateWhatIf(ScenarioPatch),
    /// Load a scenario preset
    ApplyPreset(ScenarioPreset),
    /// Reset knobs and leave projection mode
    ResetWhatIf,
}

impl Command {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeginSession { .. } => "begin_session",
            Self::EndSession => "end_session",
            Self::IngestMeta(_) => "meta",
            Self::IngestCategories(_) => "categories",
            Self::IngestSkuPerformance(_) => "sku_performance",
            Self::IngestNarration(_) => "narration",
            Self::IngestAction(_) => "action",
            Self::IngestSnapshot(_) => "snapshot",
            Self::Complete => "complete",
            Self::FeedFailed { .. } => "feed_failed",
            Self::SetBaseline(_) => "set_baseline",
            Self::OpenReview { .. } => "open_review",
            Self::CloseReview { .. } => "close_review",
            Self::Dismiss { .. } => "dismiss",
            Self::Apply { .. } => "apply",
            Self::RemoveAction { .. } => "remove_action",
            Self::SetTargetCapacity { .. } => "set_target_capacity",
            Self::ResetOverrides => "reset_overrides",
            Self::AppendMessage(_) => "append_message",
            Self::SynthesizeAction { .. } => "synthesize_action",
            Self::RunIntent(_) => "run_intent",
            Self::ActivateWhatIf => "activate_what_if",
            Self::UpdateWhatIf(_) => "update_what_if",
            Self::ApplyPreset(_) => "apply_preset",
            Self::ResetWhatIf => "reset_what_if",
        }
    }
}

/// Why a command left the state untouched
#[derive(Debug, Clone, PartialEq)]
pub enum Ignored {
    /// Message or narration id already logged
    Duplicate,
    /// No action with this id
    UnknownAction(String),
    /// Baseline not seeded yet
    MissingBaseline,
    /// Baseline already seeded
    BaselineAlreadySet,
    /// Action already applied or dismissed
    Settled(ActionStatus),
    /// Transition outside the status table
    IllegalTransition(LifecycleError),
    /// No SKU row for the requested category
    NoMatchingSku(String),
    /// Provider record failed validation
    InvalidPayload(String),
    /// Scenario knobs out of range
    InvalidScenario(ScenarioError),
    /// Intent must go to the instruction provider
    NotLocal,
}

/// Result of one reduction
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State changed
    Changed,
    /// An action was created with this id
    Created(String),
    /// Nothing changed
    Ignored(Ignored),
    /// Command belonged to a session that has been replaced
    Stale,
}

impl Outcome {
    /// True when listeners should be notified
    #[inline]
    #[must_use]
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed | Self::Created(_))
    }
}

impl From<Ignored> for Outcome {
    fn from(reason: Ignored) -> Self {
        Self::Ignored(reason)
    }
}

/// State of one store session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    store_id: Option<String>,
    status: FeedStatus,
    meta: Option<StoreMeta>,
    generated_at: Option<DateTime<Utc>>,
    categories: Vec<CategorySummary>,
    sku_performance: Vec<SkuRow>,
    baseline: Option<Baseline>,
    ledger: OverrideLedger,
    catalog: ActionCatalog,
    conversation: ConversationLog,
    what_if: WhatIfSession,
    #[serde(skip)]
    engine: AdjustmentEngine,
    #[serde(skip)]
    conversation_window: usize,
}

impl SessionState {
    /// Create idle state from `config`
    #[must_use]
    pub fn new(config: &PulseConfig) -> Self {
        Self {
            store_id: None,
            status: FeedStatus::Idle,
            meta: None,
            generated_at: None,
            categories: Vec::new(),
            sku_performance: Vec::new(),
            baseline: None,
            ledger: OverrideLedger::new(),
            catalog: ActionCatalog::new(),
            conversation: ConversationLog::new(),
            what_if: WhatIfSession::new(config.projection),
            engine: AdjustmentEngine::new(config.ledger),
            conversation_window: config.conversation_window,
        }
    }

    /// Store the session is bound to
    #[must_use]
    pub fn store_id(&self) -> Option<&str> {
        self.store_id.as_deref()
    }

    /// Feed status
    #[inline]
    #[must_use]
    pub fn status(&self) -> FeedStatus {
        self.status
    }

    /// Displayed store metadata
    #[must_use]
    pub fn meta(&self) -> Option<&StoreMeta> {
        self.meta.as_ref()
    }

    /// Provider timestamp of the latest meta
    #[must_use]
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }

    /// Category reference context
    #[must_use]
    pub fn categories(&self) -> &[CategorySummary] {
        &self.categories
    }

    /// SKU reference context
    #[must_use]
    pub fn sku_performance(&self) -> &[SkuRow] {
        &self.sku_performance
    }

    /// Seeded baseline
    #[must_use]
    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    /// Accumulated overrides
    #[must_use]
    pub fn ledger(&self) -> &OverrideLedger {
        &self.ledger
    }

    /// Known actions
    #[must_use]
    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Full conversation log
    #[must_use]
    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    /// Conversation window for display
    #[must_use]
    pub fn recent_conversation(&self) -> Vec<&ConversationMessage> {
        self.conversation.recent(self.conversation_window)
    }

    /// What-if session
    #[must_use]
    pub fn what_if(&self) -> &WhatIfSession {
        &self.what_if
    }

    /// Projected KPIs while projection mode is on
    #[must_use]
    pub fn scenario_kpis(&self) -> Option<&ScenarioKpis> {
        self.what_if.kpis()
    }

    /// Baseline with overrides applied; `None` before seeding
    #[must_use]
    pub fn effective_summary(&self) -> Option<EffectiveSummary> {
        self.baseline
            .as_ref()
            .map(|b| EffectiveSummary::derive(b, &self.ledger, self.engine.tuning()))
    }

    fn clear(&mut self) {
        self.store_id = None;
        self.meta = None;
        self.generated_at = None;
        self.categories.clear();
        self.sku_performance.clear();
        self.baseline = None;
        self.ledger.reset();
        self.catalog.clear();
        self.conversation.clear();
        self.what_if.reset();
    }

    fn system_message(&mut self, text: String, action_id: Option<&str>, now: DateTime<Utc>) {
        let mut message = ConversationMessage::new(Role::System, text, now);
        if let Some(id) = action_id {
            message = message.with_action(id);
        }
        self.conversation.append(message);
    }

    /// Seed the baseline once meta and categories are both known
    fn seed_baseline(&mut self) {
        if self.baseline.is_some() || self.categories.is_empty() {
            return;
        }
        let Some(meta) = &self.meta else {
            return;
        };
        let baseline = Baseline::from_parts(meta, &self.categories, &self.sku_performance);
        tracing::info!(
            store = %meta.id,
            capacity_pct = baseline.capacity_pct,
            on_hand = baseline.on_hand,
            categories = baseline.categories.len(),
            "Baseline seeded"
        );
        self.baseline = Some(baseline);
        self.what_if.refresh(self.baseline.as_ref());
    }

    fn upsert_action(&mut self, action: Action) -> Outcome {
        if let Err(err) = action.validate() {
            tracing::warn!(action = %action.id, error = %err, "Dropping malformed action");
            return Ignored::InvalidPayload(err.to_string()).into();
        }
        let id = action.id.clone();
        match self.catalog.upsert(action) {
            Upsert::Inserted => {
                tracing::info!(action = %id, "Action received");
                Outcome::Changed
            }
            Upsert::Updated => {
                tracing::debug!(action = %id, "Action updated");
                Outcome::Changed
            }
            Upsert::Settled(status) => {
                tracing::debug!(action = %id, %status, "Ignoring settled action");
                Ignored::Settled(status).into()
            }
        }
    }

    fn ingest_narration(&mut self, entries: Vec<NarrationEntry>, now: DateTime<Utc>) -> Outcome {
        let valid: Vec<NarrationEntry> = entries
            .into_iter()
            .filter(|entry| match entry.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(id = %entry.id, error = %err, "Dropping malformed narration");
                    false
                }
            })
            .collect();
        if self.conversation.append_narration(valid, now) > 0 {
            Outcome::Changed
        } else {
            Ignored::Duplicate.into()
        }
    }

    fn ingest_snapshot(&mut self, snapshot: SnapshotPayload, now: DateTime<Utc>) -> Outcome {
        tracing::info!(
            store = %snapshot.store.id,
            actions = snapshot.actions.len(),
            narration = snapshot.narration.len(),
            "Ingesting snapshot"
        );
        self.generated_at = snapshot.generated_at;
        self.meta = Some(snapshot.store);
        self.categories = snapshot.categories;
        self.sku_performance = snapshot.sku_performance;
        self.ingest_narration(snapshot.narration, now);
        for action in snapshot.actions {
            self.upsert_action(action);
        }
        self.seed_baseline();
        Outcome::Changed
    }

    fn apply(&mut self, action_id: &str, now: DateTime<Utc>) -> Outcome {
        let Some(status) = self.catalog.status(action_id) else {
            return Ignored::UnknownAction(action_id.to_string()).into();
        };
        if status.is_terminal() {
            tracing::debug!(action = %action_id, %status, "Apply ignored");
            return Ignored::Settled(status).into();
        }
        let Some(action) = self.catalog.get(action_id).cloned() else {
            return Ignored::UnknownAction(action_id.to_string()).into();
        };
        if let Err(err) = validate_transition(status, ActionStatus::Applied) {
            return Ignored::IllegalTransition(err).into();
        }

        match self
            .engine
            .apply(&mut self.ledger, self.baseline.as_ref(), &action, Some(status))
        {
            ApplyOutcome::Applied(_) => {
                if let Err(err) = self.catalog.transition(action_id, ActionStatus::Applied) {
                    return Ignored::IllegalTransition(err).into();
                }
                self.system_message(
                    format!("Applied {}. Shifted {}.", action.title, action.describe_shift()),
                    Some(action_id),
                    now,
                );
                Outcome::Changed
            }
            ApplyOutcome::Skipped(status) => Ignored::Settled(status).into(),
            ApplyOutcome::MissingBaseline => Ignored::MissingBaseline.into(),
        }
    }

    fn dismiss(&mut self, action_id: &str, now: DateTime<Utc>) -> Outcome {
        let description = self.catalog.get(action_id).map(Action::describe_shift);
        match self.catalog.transition(action_id, ActionStatus::Dismissed) {
            Ok(_) => {
                let text = match description {
                    Some(shift) => format!("Dismissed recommendation to shift {shift}."),
                    None => format!("Dismissed recommendation {action_id}."),
                };
                self.system_message(text, Some(action_id), now);
                tracing::info!(action = %action_id, "Action dismissed");
                Outcome::Changed
            }
            Err(err) => transition_refused(err, self.catalog.status(action_id)),
        }
    }

    fn set_target_capacity(&mut self, pct: f64) -> Outcome {
        if self
            .engine
            .set_target_capacity(&mut self.ledger, self.baseline.as_ref(), pct)
        {
            Outcome::Changed
        } else {
            Ignored::MissingBaseline.into()
        }
    }

    fn run_intent(&mut self, intent: Intent, now: DateTime<Utc>) -> Outcome {
        match intent {
            Intent::Dismiss => match self.catalog.first_actionable().map(|a| a.id.clone()) {
                Some(id) => self.dismiss(&id, now),
                None => {
                    self.system_message("No pending recommendations to dismiss.".into(), None, now);
                    Outcome::Changed
                }
            },
            Intent::Apply => match self.catalog.first_actionable().map(|a| a.id.clone()) {
                Some(id) => match self.apply(&id, now) {
                    Outcome::Ignored(Ignored::MissingBaseline) => {
                        self.system_message(
                            "Store summary is still loading; nothing applied yet.".into(),
                            Some(&id),
                            now,
                        );
                        Outcome::Changed
                    }
                    other => other,
                },
                None => {
                    self.system_message("No pending recommendations to apply.".into(), None, now);
                    Outcome::Changed
                }
            },
            Intent::TargetCapacity(pct) => {
                let text = if self.set_target_capacity(f64::from(pct)).is_changed() {
                    let baseline = self.baseline.as_ref().map_or(0.0, |b| b.capacity_pct);
                    let current = baseline + self.ledger.capacity_offset();
                    format!(
                        "Targeting capacity near {}% as requested.",
                        (current * 100.0).round()
                    )
                } else {
                    "Store summary is still loading; capacity target not set.".to_string()
                };
                self.system_message(text, None, now);
                Outcome::Changed
            }
            Intent::Reset => {
                self.ledger.reset();
                self.system_message("Restored store metrics to baseline values.".into(), None, now);
                Outcome::Changed
            }
            Intent::Delegate => Ignored::NotLocal.into(),
        }
    }

    fn synthesize(&mut self, category: &str, intent: SynthesisIntent) -> Outcome {
        let skus = if self.sku_performance.is_empty() {
            self.baseline
                .as_ref()
                .map_or(&[][..], |b| b.sku_performance.as_slice())
        } else {
            self.sku_performance.as_slice()
        };
        match synthesize(category, intent, skus, &self.categories) {
            Some(action) => {
                let id = action.id.clone();
                self.catalog.upsert(action);
                Outcome::Created(id)
            }
            None => {
                tracing::debug!(%category, "No SKU rows for ad-hoc action");
                Ignored::NoMatchingSku(category.to_string()).into()
            }
        }
    }
}

fn transition_refused(err: LifecycleError, status: Option<ActionStatus>) -> Outcome {
    match (err, status) {
        (LifecycleError::UnknownAction(id), _) => Ignored::UnknownAction(id).into(),
        (_, Some(status)) if status.is_terminal() => Ignored::Settled(status).into(),
        (err, _) => Ignored::IllegalTransition(err).into(),
    }
}

/// Apply `command` to `state`
///
/// `now` stamps any message the command appends.
pub fn reduce(state: &mut SessionState, command: Command, now: DateTime<Utc>) -> Outcome {
    match command {
        Command::BeginSession { store_id } => {
            state.clear();
            tracing::info!(store = %store_id, "Session started");
            state.store_id = Some(store_id);
            state.status = FeedStatus::Listening;
            Outcome::Changed
        }
        Command::EndSession => {
            state.clear();
            state.status = FeedStatus::Idle;
            tracing::info!("Session ended");
            Outcome::Changed
        }
        Command::IngestMeta(meta) => {
            state.generated_at = meta.generated_at;
            state.meta = Some(meta.store);
            Outcome::Changed
        }
        Command::IngestCategories(categories) => {
            state.categories = categories;
            Outcome::Changed
        }
        Command::IngestSkuPerformance(rows) => {
            state.sku_performance = rows;
            state.seed_baseline();
            Outcome::Changed
        }
        Command::IngestNarration(entries) => state.ingest_narration(entries, now),
        Command::IngestAction(action) => state.upsert_action(action),
        Command::IngestSnapshot(snapshot) => state.ingest_snapshot(snapshot, now),
        Command::Complete => {
            state.status = FeedStatus::Complete;
            state.seed_baseline();
            tracing::info!(actions = state.catalog.len(), "Feed complete");
            Outcome::Changed
        }
        Command::FeedFailed { reason } => {
            state.status = FeedStatus::Error;
            tracing::error!(%reason, "Feed unavailable");
            Outcome::Changed
        }
        Command::SetBaseline(baseline) => {
            if state.baseline.is_some() {
                return Ignored::BaselineAlreadySet.into();
            }
            state.baseline = Some(baseline);
            state.what_if.refresh(state.baseline.as_ref());
            Outcome::Changed
        }
        Command::OpenReview { action_id } => {
            match state.catalog.transition(&action_id, ActionStatus::InReview) {
                Ok(_) => Outcome::Changed,
                Err(err) => transition_refused(err, state.catalog.status(&action_id)),
            }
        }
        Command::CloseReview { action_id } => {
            match state.catalog.transition(&action_id, ActionStatus::Pending) {
                Ok(_) => Outcome::Changed,
                Err(err) => transition_refused(err, state.catalog.status(&action_id)),
            }
        }
        Command::Dismiss { action_id } => state.dismiss(&action_id, now),
        Command::Apply { action_id } => state.apply(&action_id, now),
        Command::RemoveAction { action_id } => match state.catalog.remove(&action_id) {
            Some(_) => Outcome::Changed,
            None => Ignored::UnknownAction(action_id).into(),
        },
        Command::SetTargetCapacity { pct } => state.set_target_capacity(pct),
        Command::ResetOverrides => {
            state.ledger.reset();
            tracing::info!("Overrides reset");
            Outcome::Changed
        }
        Command::AppendMessage(message) => {
            if state.conversation.append(message) {
                Outcome::Changed
            } else {
                Ignored::Duplicate.into()
            }
        }
        Command::SynthesizeAction { category, intent } => state.synthesize(&category, intent),
        Command::RunIntent(intent) => state.run_intent(intent, now),
        Command::ActivateWhatIf => {
            state.what_if.activate(state.baseline.as_ref());
            Outcome::Changed
        }
        Command::UpdateWhatIf(patch) => {
            match state.what_if.update(&patch, state.baseline.as_ref()) {
                Ok(_) => Outcome::Changed,
                Err(err) => {
                    tracing::warn!(error = %err, "Rejected scenario change");
                    Ignored::InvalidScenario(err).into()
                }
            }
        }
        Command::ApplyPreset(preset) => {
            state.what_if.apply_preset(preset, state.baseline.as_ref());
            Outcome::Changed
        }
        Command::ResetWhatIf => {
            state.what_if.reset();
            Outcome::Changed
        }
    }
}
