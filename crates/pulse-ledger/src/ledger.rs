//! Override ledger
//!
//! Additive deltas accumulated over applied actions. The ledger never holds
//! absolute values; [`EffectiveSummary`](crate::EffectiveSummary) combines it
//! with the baseline on read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Accumulated overrides on top of a baseline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideLedger {
    category_adjustments: IndexMap<String, f64>,
    capacity_offset: f64,
    on_hand_offset: i64,
}

impl OverrideLedger {
    /// Create empty ledger
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signed mix delta per category, in first-touched order
    #[inline]
    #[must_use]
    pub fn category_adjustments(&self) -> &IndexMap<String, f64> {
        &self.category_adjustments
    }

    /// Delta for one category, zero when untouched
    #[inline]
    #[must_use]
    pub fn adjustment(&self, category: &str) -> f64 {
        self.category_adjustments
            .get(category)
            .copied()
            .unwrap_or(0.0)
    }

    /// Signed capacity ratio offset
    #[inline]
    #[must_use]
    pub fn capacity_offset(&self) -> f64 {
        self.capacity_offset
    }

    /// Signed on-hand unit offset
    #[inline]
    #[must_use]
    pub fn on_hand_offset(&self) -> i64 {
        self.on_hand_offset
    }

    /// Move `ratio` of the mix from `source` to `target`
    pub fn shift_mix(&mut self, source: &str, target: &str, ratio: f64) {
        *self
            .category_adjustments
            .entry(source.to_string())
            .or_insert(0.0) -= ratio;
        *self
            .category_adjustments
            .entry(target.to_string())
            .or_insert(0.0) += ratio;
    }

    /// Lower the capacity offset by `delta`
    #[inline]
    pub fn relieve_capacity(&mut self, delta: f64) {
        self.capacity_offset -= delta;
    }

    /// Lower the on-hand offset by `units`
    #[inline]
    pub fn relieve_on_hand(&mut self, units: i64) {
        self.on_hand_offset = self.on_hand_offset.saturating_sub(units);
    }

    /// Replace the capacity offset outright
    #[inline]
    pub fn set_capacity_offset(&mut self, offset: f64) {
        self.capacity_offset = offset;
    }

    /// Drop every override
    pub fn reset(&mut self) {
        self.category_adjustments.clear();
        self.capacity_offset = 0.0;
        self.on_hand_offset = 0;
    }

    /// True when no override has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category_adjustments.is_empty()
            && self.capacity_offset == 0.0
            && self.on_hand_offset == 0
    }
}
