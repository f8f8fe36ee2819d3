//! Effective summary derivation

use crate::ledger::OverrideLedger;
use crate::tuning::LedgerTuning;
use pulse_model::{inventory_health_with_penalty, Baseline, CategoryMix};
use serde::{Deserialize, Serialize};

/// Baseline with the ledger applied, as shown to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSummary {
    /// Renormalized mix over the baseline categories
    pub categories: CategoryMix,
    /// Capacity ratio, never below the tuning floor
    pub capacity_pct: f64,
    /// On-hand units, never negative
    pub on_hand: u64,
    /// Health score for `capacity_pct`
    pub inventory_health: u8,
}

impl EffectiveSummary {
    /// Combine `baseline` and `ledger`
    ///
    /// Each category is floored at zero before renormalizing. When every
    /// category reaches zero the all-zero mix is returned as is. Adjustments
    /// for categories missing from the baseline do not contribute.
    #[must_use]
    pub fn derive(baseline: &Baseline, ledger: &OverrideLedger, tuning: &LedgerTuning) -> Self {
        let raw: Vec<(&str, f64)> = baseline
            .categories
            .iter()
            .map(|(name, pct)| (name, (pct + ledger.adjustment(name)).max(0.0)))
            .collect();
        let total: f64 = raw.iter().map(|(_, v)| v).sum();
        let categories = if total > 0.0 {
            CategoryMix::from_pairs(raw.into_iter().map(|(n, v)| (n, v / total)))
        } else {
            CategoryMix::from_pairs(raw)
        };

        let capacity_pct =
            (baseline.capacity_pct + ledger.capacity_offset()).max(tuning.capacity_floor);

        let on_hand = (i128::from(baseline.on_hand) + i128::from(ledger.on_hand_offset()))
            .clamp(0, i128::from(u64::MAX));
        let on_hand = u64::try_from(on_hand).unwrap_or(0);

        Self {
            categories,
            capacity_pct,
            on_hand,
            inventory_health: inventory_health_with_penalty(capacity_pct, tuning.health_penalty),
        }
    }

    /// Summary of an untouched baseline
    #[must_use]
    pub fn of_baseline(baseline: &Baseline, tuning: &LedgerTuning) -> Self {
        Self::derive(baseline, &OverrideLedger::new(), tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn baseline() -> Baseline {
        Baseline::new(
            CategoryMix::from_pairs([("A", 0.6), ("B", 0.4)]),
            1.05,
            10_000,
            Vec::new(),
        )
    }

    #[test]
    fn untouched_baseline_passes_through() {
        let summary = EffectiveSummary::of_baseline(&baseline(), &LedgerTuning::default());
        assert!((summary.categories.get("A").unwrap() - 0.6).abs() < 1e-9);
        assert_eq!(summary.on_hand, 10_000);
        assert_eq!(summary.inventory_health, 75);
    }

    #[test]
    fn negative_categories_floor_at_zero() {
        let mut ledger = OverrideLedger::new();
        ledger.shift_mix("A", "B", 0.9);
        let summary = EffectiveSummary::derive(&baseline(), &ledger, &LedgerTuning::default());
        assert_eq!(summary.categories.get("A"), Some(0.0));
        assert!((summary.categories.get("B").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn all_zero_mix_is_left_unnormalized() {
        let base = Baseline::new(
            CategoryMix::from_pairs([("A", 0.5), ("B", 0.5)]),
            1.0,
            100,
            Vec::new(),
        );
        let mut ledger = OverrideLedger::new();
        // Mass leaves for a category outside the baseline
        ledger.shift_mix("A", "Z", 0.6);
        ledger.shift_mix("B", "Z", 0.6);
        let summary = EffectiveSummary::derive(&base, &ledger, &LedgerTuning::default());
        assert_eq!(summary.categories.total(), 0.0);
        assert_eq!(summary.categories.len(), 2);
        assert_eq!(summary.categories.get("Z"), None);
    }

    #[test]
    fn capacity_and_on_hand_are_floored() {
        let mut ledger = OverrideLedger::new();
        ledger.relieve_capacity(2.0);
        ledger.relieve_on_hand(50_000);
        let summary = EffectiveSummary::derive(&baseline(), &ledger, &LedgerTuning::default());
        assert!((summary.capacity_pct - 0.6).abs() < 1e-12);
        assert_eq!(summary.on_hand, 0);
        assert_eq!(summary.inventory_health, 0);
    }
}
