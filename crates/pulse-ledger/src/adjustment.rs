//! Inventory adjustment engine
//!
//! Turns an action into one additive ledger update:
//! - the mix moves `shift_pct / 100` from source to target
//! - capacity is relieved by `ratio * 0.2`, at least `0.05` for a positive shift
//! - on-hand is relieved in proportion, scaled with the capacity floor
//!
//! The engine is a pure function of `(ledger, baseline, action, status)`;
//! status tracking stays with the caller.

use crate::ledger::OverrideLedger;
use crate::tuning::LedgerTuning;
use pulse_model::{Action, ActionStatus, Baseline};
use serde::{Deserialize, Serialize};

/// Ledger deltas produced by one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftEffect {
    /// Category giving up mix
    pub source: String,
    /// Category receiving mix
    pub target: String,
    /// Fraction of mix moved
    pub ratio: f64,
    /// Capacity relief subtracted from the offset
    pub capacity_delta: f64,
    /// Units subtracted from the on-hand offset
    pub on_hand_delta: i64,
}

/// Result of [`AdjustmentEngine::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Ledger updated with this effect
    Applied(ShiftEffect),
    /// Action already in a terminal status; ledger untouched
    Skipped(ActionStatus),
    /// No baseline seeded yet; ledger untouched
    MissingBaseline,
}

impl ApplyOutcome {
    /// True when the ledger changed
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Applies actions to an [`OverrideLedger`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AdjustmentEngine {
    tuning: LedgerTuning,
}

impl AdjustmentEngine {
    /// Create engine with `tuning`
    #[inline]
    #[must_use]
    pub fn new(tuning: LedgerTuning) -> Self {
        Self { tuning }
    }

    /// Tuning in use
    #[inline]
    #[must_use]
    pub fn tuning(&self) -> &LedgerTuning {
        &self.tuning
    }

    /// Deltas `action` would contribute against `baseline`
    #[must_use]
    pub fn effect(&self, action: &Action, baseline: &Baseline) -> ShiftEffect {
        let ratio = action.shift_ratio();

        let base_capacity = ratio * self.tuning.capacity_relief_per_shift;
        let capacity_delta = if base_capacity > 0.0 {
            base_capacity.max(self.tuning.min_capacity_relief)
        } else {
            0.0
        };
        let scale = if base_capacity > 0.0 {
            capacity_delta / base_capacity
        } else {
            1.0
        };

        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let on_hand_delta = {
            let base = (baseline.on_hand as f64 * ratio * self.tuning.on_hand_relief_per_shift)
                .round();
            // one-unit minimum only once the unscaled relief rounds to a unit
            if base > 0.0 {
                ((base * scale).round() as i64).max(1)
            } else {
                0
            }
        };

        ShiftEffect {
            source: action.source_category.clone(),
            target: action.target_category.clone(),
            ratio,
            capacity_delta,
            on_hand_delta,
        }
    }

    /// Apply `action` to `ledger`
    ///
    /// `status` is the tracked status of the action. Terminal statuses and a
    /// missing baseline leave the ledger untouched.
    pub fn apply(
        &self,
        ledger: &mut OverrideLedger,
        baseline: Option<&Baseline>,
        action: &Action,
        status: Option<ActionStatus>,
    ) -> ApplyOutcome {
        if let Some(status) = status.filter(|s| s.is_terminal()) {
            tracing::debug!(action = %action.id, %status, "Action already settled");
            return ApplyOutcome::Skipped(status);
        }
        let Some(baseline) = baseline else {
            tracing::warn!(action = %action.id, "No baseline seeded, ignoring apply");
            return ApplyOutcome::MissingBaseline;
        };

        let effect = self.effect(action, baseline);
        ledger.shift_mix(&effect.source, &effect.target, effect.ratio);
        ledger.relieve_capacity(effect.capacity_delta);
        ledger.relieve_on_hand(effect.on_hand_delta);

        tracing::info!(
            action = %action.id,
            source = %effect.source,
            target = %effect.target,
            ratio = effect.ratio,
            capacity_delta = effect.capacity_delta,
            on_hand_delta = effect.on_hand_delta,
            "Applied action to ledger"
        );
        ApplyOutcome::Applied(effect)
    }

    /// Point the capacity offset at `target_pct` percent
    ///
    /// Returns `false` without a baseline. The effective capacity floor
    /// still applies on read.
    pub fn set_target_capacity(
        &self,
        ledger: &mut OverrideLedger,
        baseline: Option<&Baseline>,
        target_pct: f64,
    ) -> bool {
        let Some(baseline) = baseline else {
            return false;
        };
        if !target_pct.is_finite() {
            return false;
        }
        ledger.set_capacity_offset(target_pct / 100.0 - baseline.capacity_pct);
        tracing::info!(target_pct, "Set target capacity");
        true
    }
}
