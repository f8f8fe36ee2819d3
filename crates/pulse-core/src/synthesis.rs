//! Ad-hoc action synthesis
//!
//! Builds a recommendation from the SKU reference rows when the user asks to
//! trim or grow a category directly.

use pulse_model::{
    new_action_id, Action, AddCandidate, CategorySummary, RemoveCandidate, Severity, SkuRow,
};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_CANDIDATES: usize = 3;
const MIN_SHIFT_PCT: f64 = 3.0;
const TOP_FIT_SCORE: f64 = 93.0;
const FIT_SCORE_STEP: f64 = 5.0;

/// Direction of an ad-hoc request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisIntent {
    /// Reduce the category's share
    Remove,
    /// Grow the category's share
    Add,
}

impl fmt::Display for SynthesisIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => write!(f, "remove"),
            Self::Add => write!(f, "add"),
        }
    }
}

/// Build an action for `category`
///
/// Returns `None` when no SKU row belongs to `category` (case-insensitive).
/// A removal moves mix to the lightest other category; an addition draws
/// it from the heaviest one.
#[must_use]
pub fn synthesize(
    category: &str,
    intent: SynthesisIntent,
    skus: &[SkuRow],
    categories: &[CategorySummary],
) -> Option<Action> {
    let wanted = category.trim();
    let mut matches: Vec<&SkuRow> = skus
        .iter()
        .filter(|sku| sku.category.eq_ignore_ascii_case(wanted))
        .collect();
    let name = matches.first()?.category.clone();
    matches.sort_by_key(|sku| sku.ranking);
    matches.truncate(MAX_CANDIDATES);

    let others = categories.iter().filter(|c| !c.name.eq_ignore_ascii_case(&name));
    let (source, target) = match intent {
        SynthesisIntent::Remove => {
            let lightest = others
                .min_by(|a, b| a.pct.total_cmp(&b.pct))
                .map_or_else(|| name.clone(), |c| c.name.clone());
            (name.clone(), lightest)
        }
        SynthesisIntent::Add => {
            let heaviest = others
                .max_by(|a, b| a.pct.total_cmp(&b.pct))
                .map_or_else(|| name.clone(), |c| c.name.clone());
            (heaviest, name.clone())
        }
    };

    let footprint: f64 = matches.iter().map(|sku| sku.capacity_pct).sum();
    let shift_pct = (footprint * 100.0).round().max(MIN_SHIFT_PCT).min(100.0);

    let remove: Vec<RemoveCandidate> = match intent {
        SynthesisIntent::Remove => matches
            .iter()
            .map(|sku| RemoveCandidate {
                id: sku.id.clone(),
                name: sku.name.clone(),
                reason: sku.reason.clone(),
                ranking: sku.ranking,
                capacity_pct: (sku.capacity_pct * 100.0).round(),
            })
            .collect(),
        SynthesisIntent::Add => Vec::new(),
    };
    let add: Vec<AddCandidate> = match intent {
        SynthesisIntent::Remove => Vec::new(),
        SynthesisIntent::Add => restock_candidates(&name, matches.len()),
    };

    let (title, summary) = match intent {
        SynthesisIntent::Remove => (
            format!("Trim {name}"),
            format!("Pull slow {name} SKUs and give {shift_pct}% of bay space to {target}."),
        ),
        SynthesisIntent::Add => (
            format!("Expand {name}"),
            format!("Reclaim {shift_pct}% of bay space from {source} for {name} restocks."),
        ),
    };
    let severity = if remove.is_empty() {
        Severity::Medium
    } else {
        Severity::High
    };

    tracing::info!(category = %name, %intent, shift_pct, "Synthesized ad-hoc action");
    Some(Action {
        id: new_action_id(),
        title,
        summary,
        voice_summary: None,
        severity,
        kind: format!("adhoc-{intent}"),
        shift_pct,
        source_category: source,
        target_category: target,
        remove,
        add,
    })
}

fn restock_candidates(category: &str, count: usize) -> Vec<AddCandidate> {
    let prefix: String = category.chars().take(3).collect::<String>().to_uppercase();
    (1..=count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let fit_score = TOP_FIT_SCORE - FIT_SCORE_STEP * (i - 1) as f64;
            AddCandidate {
                id: format!("{prefix}-RESTOCK-{i}"),
                name: format!("{category} replenishment {i}"),
                fit_score,
                rationale: format!("Restock fast movers in {}.", category.to_lowercase()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sku(id: &str, category: &str, ranking: u32, capacity_pct: f64) -> SkuRow {
        SkuRow {
            id: id.into(),
            name: format!("SKU {id}"),
            category: category.into(),
            on_hand: 100,
            weekly_sales: 4.0,
            capacity_pct,
            reason: "slow mover".into(),
            ranking,
        }
    }

    fn categories() -> Vec<CategorySummary> {
        vec![
            CategorySummary::new("Seasonal", 0.4),
            CategorySummary::new("Pantry", 0.35),
            CategorySummary::new("Garden", 0.25),
        ]
    }

    fn skus() -> Vec<SkuRow> {
        vec![
            sku("s-4", "Seasonal", 4, 0.02),
            sku("s-1", "Seasonal", 1, 0.03),
            sku("s-3", "Seasonal", 3, 0.04),
            sku("s-2", "Seasonal", 2, 0.01),
            sku("p-1", "Pantry", 1, 0.05),
        ]
    }

    #[test]
    fn remove_trims_lowest_ranked_skus() {
        let action = synthesize("seasonal", SynthesisIntent::Remove, &skus(), &categories()).unwrap();
        let ids: Vec<_> = action.remove.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s-1", "s-2", "s-3"]);
        assert!((action.remove[0].capacity_pct - 3.0).abs() < 1e-9);
        assert_eq!(action.source_category, "Seasonal");
        assert_eq!(action.target_category, "Garden");
        assert_eq!(action.severity, Severity::High);
        assert!(action.add.is_empty());
        assert!((action.shift_pct - 8.0).abs() < 1e-9);
        assert!(action.validate().is_ok());
    }

    #[test]
    fn add_draws_from_heaviest_other_category() {
        let action = synthesize("Pantry", SynthesisIntent::Add, &skus(), &categories()).unwrap();
        assert_eq!(action.source_category, "Seasonal");
        assert_eq!(action.target_category, "Pantry");
        assert_eq!(action.severity, Severity::Medium);
        assert!(action.remove.is_empty());
        assert_eq!(action.add.len(), 1);
        assert_eq!(action.add[0].id, "PAN-RESTOCK-1");
        assert!((action.add[0].fit_score - 93.0).abs() < 1e-9);
        assert!((action.shift_pct - 5.0).abs() < 1e-9);
    }

    #[test]
    fn small_footprint_gets_minimum_shift() {
        let rows = vec![sku("g-1", "Garden", 1, 0.001)];
        let action = synthesize("Garden", SynthesisIntent::Remove, &rows, &categories()).unwrap();
        assert!((action.shift_pct - 3.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_category_creates_nothing() {
        assert!(synthesize("Automotive", SynthesisIntent::Remove, &skus(), &categories()).is_none());
        assert!(synthesize("Pantry", SynthesisIntent::Add, &[], &categories()).is_none());
    }

    #[test]
    fn lone_category_targets_itself() {
        let action = synthesize("Pantry", SynthesisIntent::Remove, &skus(), &[]).unwrap();
        assert_eq!(action.source_category, "Pantry");
        assert_eq!(action.target_category, "Pantry");
    }
}
