//! Store summary records
//!
//! Store identity, totals, category mix and the per-SKU reference rows, plus
//! the session [`Baseline`] built from them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Penalty applied per unit of capacity deviation from 100% in the health score
pub const DEFAULT_HEALTH_PENALTY: f64 = 500.0;

/// Inventory health score for a capacity ratio.
///
/// Symmetric around 100% capacity, saturating at 0 and 100.
#[inline]
#[must_use]
pub fn inventory_health(capacity_pct: f64) -> u8 {
    inventory_health_with_penalty(capacity_pct, DEFAULT_HEALTH_PENALTY)
}

/// Inventory health score with an explicit deviation penalty
#[must_use]
pub fn inventory_health_with_penalty(capacity_pct: f64, penalty: f64) -> u8 {
    let score = (100.0 - (capacity_pct - 1.0).abs() * penalty).round();
    if score.is_nan() {
        return 0;
    }
    // clamped to [0, 100] so the cast is lossless
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamped = score.clamp(0.0, 100.0) as u8;
    clamped
}

/// One category's share of bay space as carried on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category name (unique within a summary)
    pub name: String,
    /// Fraction of the mix in `[0, 1]`
    pub pct: f64,
}

impl CategorySummary {
    /// Create new category summary
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, pct: f64) -> Self {
        Self {
            name: name.into(),
            pct,
        }
    }
}

/// Category name to fraction mapping, in declaration order.
///
/// A duplicate name in the source list keeps the first position and the last
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CategorySummary>", into = "Vec<CategorySummary>")]
pub struct CategoryMix {
    shares: IndexMap<String, f64>,
}

impl CategoryMix {
    /// Create empty mix
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, fraction)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            shares: pairs.into_iter().map(|(n, p)| (n.into(), p)).collect(),
        }
    }

    /// Build from wire summaries
    #[must_use]
    pub fn from_summaries(summaries: &[CategorySummary]) -> Self {
        Self::from_pairs(summaries.iter().map(|c| (c.name.clone(), c.pct)))
    }

    /// Fraction for a category, if present
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.shares.get(name).copied()
    }

    /// Set a category fraction, appending new names at the end
    #[inline]
    pub fn set(&mut self, name: impl Into<String>, pct: f64) {
        self.shares.insert(name.into(), pct);
    }

    /// Iterate `(name, fraction)` in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.shares.iter().map(|(n, p)| (n.as_str(), *p))
    }

    /// Category names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shares.keys().map(String::as_str)
    }

    /// Sum of all fractions
    #[must_use]
    pub fn total(&self) -> f64 {
        self.shares.values().sum()
    }

    /// Number of categories
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Whether the mix has no categories
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Convert back to wire summaries
    #[must_use]
    pub fn to_summaries(&self) -> Vec<CategorySummary> {
        self.iter().map(|(n, p)| CategorySummary::new(n, p)).collect()
    }
}

impl From<Vec<CategorySummary>> for CategoryMix {
    fn from(value: Vec<CategorySummary>) -> Self {
        Self::from_summaries(&value)
    }
}

impl From<CategoryMix> for Vec<CategorySummary> {
    fn from(value: CategoryMix) -> Self {
        value.to_summaries()
    }
}

/// Unit and capacity totals for one store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTotals {
    /// Units on hand
    pub on_hand: u64,
    /// Active SKU count
    #[serde(default)]
    pub sku_count: u64,
    /// Occupied-bay ratio, when the totals carry their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_pct: Option<f64>,
}

/// Displayed store identity, capacity and health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub capacity_pct: f64,
    pub inventory_health: u8,
    pub totals: StoreTotals,
}

impl StoreMeta {
    /// Display label: name when known, id otherwise
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Per-SKU performance reference row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuRow {
    pub id: String,
    pub name: String,
    pub category: String,
    pub on_hand: u64,
    pub weekly_sales: f64,
    pub capacity_pct: f64,
    pub reason: String,
    /// Lower ranks are the weakest performers
    pub ranking: u32,
}

/// First-observed reference summary for a store session.
///
/// Never mutated in place; every override is computed against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub categories: CategoryMix,
    pub capacity_pct: f64,
    pub on_hand: u64,
    pub sku_performance: Vec<SkuRow>,
}

impl Baseline {
    /// Create new baseline
    #[inline]
    #[must_use]
    pub fn new(
        categories: CategoryMix,
        capacity_pct: f64,
        on_hand: u64,
        sku_performance: Vec<SkuRow>,
    ) -> Self {
        Self {
            categories,
            capacity_pct,
            on_hand,
            sku_performance,
        }
    }

    /// Build from the displayed meta and the reference context
    #[must_use]
    pub fn from_parts(
        meta: &StoreMeta,
        categories: &[CategorySummary],
        sku_performance: &[SkuRow],
    ) -> Self {
        Self {
            categories: CategoryMix::from_summaries(categories),
            capacity_pct: meta.totals.capacity_pct.unwrap_or(meta.capacity_pct),
            on_hand: meta.totals.on_hand,
            sku_performance: sku_performance.to_vec(),
        }
    }

    /// Health score of the unadjusted baseline
    #[inline]
    #[must_use]
    pub fn inventory_health(&self) -> u8 {
        inventory_health(self.capacity_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn health_is_symmetric_and_saturates() {
        assert_eq!(inventory_health(1.0), 100);
        assert_eq!(inventory_health(1.05), 75);
        assert_eq!(inventory_health(0.95), 75);
        assert_eq!(inventory_health(1.4), 0);
        assert_eq!(inventory_health(0.2), 0);
        assert_eq!(inventory_health(f64::NAN), 0);
    }

    #[test]
    fn mix_keeps_declaration_order() {
        let mix = CategoryMix::from_pairs([("Rotors", 0.2), ("Batteries", 0.5), ("Filters", 0.3)]);
        let names: Vec<_> = mix.names().collect();
        assert_eq!(names, vec!["Rotors", "Batteries", "Filters"]);
        assert!((mix.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mix_serializes_as_summary_list() {
        let mix = CategoryMix::from_pairs([("A", 0.6), ("B", 0.4)]);
        let json = serde_json::to_value(&mix).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"name": "A", "pct": 0.6}, {"name": "B", "pct": 0.4}])
        );
    }

    #[test]
    fn baseline_prefers_totals_capacity() {
        let meta = StoreMeta {
            id: "ATL_050".into(),
            name: None,
            region: None,
            status: None,
            capacity_pct: 1.10,
            inventory_health: 50,
            totals: StoreTotals {
                on_hand: 9000,
                sku_count: 10,
                capacity_pct: Some(1.04),
            },
        };
        let baseline = Baseline::from_parts(&meta, &[CategorySummary::new("A", 1.0)], &[]);
        assert_eq!(baseline.capacity_pct, 1.04);
        assert_eq!(baseline.on_hand, 9000);
        assert_eq!(meta.label(), "ATL_050");
    }

    proptest! {
        #[test]
        fn health_stays_in_range_and_is_symmetric(deviation in 0.0f64..2.0) {
            let over = inventory_health(1.0 + deviation);
            let under = inventory_health(1.0 - deviation);
            prop_assert!(over <= 100);
            prop_assert!(over.abs_diff(under) <= 1);
        }

        #[test]
        fn health_never_rises_with_deviation(a in 0.0f64..1.0, b in 0.0f64..1.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(inventory_health(1.0 + near) >= inventory_health(1.0 + far));
        }

        #[test]
        fn set_overwrites_in_place_and_appends_new(
            shares in prop::collection::vec(0.0f64..1.0, 1..8),
            pick in any::<prop::sample::Index>(),
            value in 0.0f64..1.0,
        ) {
            let mut mix = CategoryMix::from_pairs(
                shares.iter().enumerate().map(|(i, p)| (format!("Cat{i}"), *p)),
            );
            let before: Vec<String> = mix.names().map(str::to_string).collect();
            let existing = before[pick.index(before.len())].clone();

            mix.set(existing.clone(), value);
            prop_assert_eq!(mix.get(&existing), Some(value));
            prop_assert_eq!(mix.names().collect::<Vec<_>>(), before.iter().map(String::as_str).collect::<Vec<_>>());

            mix.set("Fresh", value);
            prop_assert_eq!(mix.len(), before.len() + 1);
            prop_assert_eq!(mix.names().last(), Some("Fresh"));
        }
    }
}
