//! KPI projection
//!
//! ```text
//! capacity_factor = 1 + mezzanine_sqft / store_sqft
//! constraint_cap  = min(staffing ? 1 : 0.85, receiving >= 3 ? 1 : 0.9)
//! capex_effect    = 1 + ln(1 + budget / capex_scale) * capex_weight
//! revenue         = on_hand * revenue_per_unit * (1 + uplift * constraint_cap) * capex_effect
//! avg_inventory   = on_hand * capacity_factor * inventory_factor
//! turns           = revenue / (avg_inventory * revenue_per_unit) * base_turns
//! capacity_pct    = capacity_pct * capacity_factor * constants.capacity_factor
//! ```

use crate::config::ScenarioConfig;
use crate::constants::ProjectionConstants;
use pulse_model::Baseline;
use serde::{Deserialize, Serialize};

const STAFFING_SHORT_CAP: f64 = 0.85;
const SLOW_RECEIVING_CAP: f64 = 0.9;
const MIN_FULL_RECEIVING: u8 = 3;

/// Projected KPIs for one scenario
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioKpis {
    /// Projected revenue
    pub revenue: f64,
    /// Projected average inventory units
    pub avg_inventory: f64,
    /// Projected inventory turns
    pub turns: f64,
    /// Projected capacity ratio
    pub capacity_pct: f64,
    /// Projected on-hand units
    pub on_hand: u64,
}

/// Intermediate factors of one projection, kept for display and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// `1 + mezzanine / store area`
    pub capacity_factor: f64,
    /// Uplift fraction of the chosen preset
    pub uplift_factor: f64,
    /// Constraint multiplier on the uplift
    pub constraint_cap: f64,
    /// Capex multiplier on revenue
    pub capex_effect: f64,
    /// Resulting KPIs
    pub kpis: ScenarioKpis,
}

/// Project `config` against `baseline`
///
/// Pure: identical inputs give bit-identical output.
#[must_use]
pub fn project(
    baseline: &Baseline,
    config: &ScenarioConfig,
    constants: &ProjectionConstants,
) -> Projection {
    let capacity_factor = 1.0 + config.mezzanine_sqft / constants.store_sqft;
    let uplift_factor = constants.uplift.factor(config.uplift_preset);

    let staffing_cap = if config.constraints.staffing_ok {
        1.0
    } else {
        STAFFING_SHORT_CAP
    };
    let receiving_cap = if config.constraints.receiving_xpw >= MIN_FULL_RECEIVING {
        1.0
    } else {
        SLOW_RECEIVING_CAP
    };
    let constraint_cap = staffing_cap.min(receiving_cap);

    let capex_effect =
        1.0 + (1.0 + config.add_budget / constants.capex_scale).ln() * constants.capex_weight;
    let sales_uplift = uplift_factor * constraint_cap;

    #[allow(clippy::cast_precision_loss)]
    let on_hand = baseline.on_hand as f64;
    let base_revenue = on_hand * constants.revenue_per_unit;
    let revenue = base_revenue * (1.0 + sales_uplift) * capex_effect;
    let avg_inventory = on_hand * capacity_factor * constants.inventory_factor;
    let inventory_value = avg_inventory * constants.revenue_per_unit;
    let turns = if inventory_value > 0.0 {
        revenue / inventory_value * constants.base_turns
    } else {
        0.0
    };
    let capacity_pct = baseline.capacity_pct * capacity_factor * constants.capacity_factor;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let projected_on_hand = avg_inventory.round().max(0.0) as u64;

    Projection {
        capacity_factor,
        uplift_factor,
        constraint_cap,
        capex_effect,
        kpis: ScenarioKpis {
            revenue,
            avg_inventory,
            turns,
            capacity_pct,
            on_hand: projected_on_hand,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScenarioConstraints, ScenarioPreset, UpliftPreset};
    use proptest::prelude::*;
    use pulse_model::CategoryMix;

    fn baseline(on_hand: u64, capacity_pct: f64) -> Baseline {
        Baseline::new(
            CategoryMix::from_pairs([("Pantry", 1.0)]),
            capacity_pct,
            on_hand,
            Vec::new(),
        )
    }

    #[test]
    fn mezzanine_preset_regression() {
        let projection = project(
            &baseline(8_000, 1.0),
            &ScenarioPreset::Mezzanine.config(),
            &ProjectionConstants::default(),
        );
        assert!((projection.capacity_factor - 1.125).abs() < 1e-12);
        assert!((projection.constraint_cap - 0.9).abs() < 1e-12);
        assert!((projection.capex_effect - 1.060_819_8).abs() < 1e-6);

        let kpis = projection.kpis;
        assert!((kpis.revenue - 405_954.5).abs() < 1.0);
        assert!((kpis.avg_inventory - 8_550.0).abs() < 1e-9);
        assert!((kpis.turns - 4.4315).abs() < 1e-3);
        assert!((kpis.capacity_pct - 1.035).abs() < 1e-9);
        assert_eq!(kpis.on_hand, 8_550);
    }

    #[test]
    fn neutral_config_keeps_revenue() {
        let config = ScenarioConfig::default().with_uplift(UpliftPreset::Conservative);
        let kpis = project(&baseline(1_000, 1.0), &config, &ProjectionConstants::default()).kpis;
        assert!((kpis.revenue - 45_000.0 * 1.03).abs() < 1e-6);
        assert_eq!(kpis.on_hand, 950);
    }

    #[test]
    fn staffing_shortfall_caps_uplift() {
        let config = ScenarioConfig::default().with_constraints(ScenarioConstraints {
            staffing_ok: false,
            receiving_xpw: 2,
            bays: 0,
        });
        let projection = project(&baseline(1_000, 1.0), &config, &ProjectionConstants::default());
        assert!((projection.constraint_cap - 0.85).abs() < 1e-12);
    }

    #[test]
    fn empty_store_has_zero_turns() {
        let kpis = project(
            &baseline(0, 0.9),
            &ScenarioConfig::default(),
            &ProjectionConstants::default(),
        )
        .kpis;
        assert_eq!(kpis.revenue, 0.0);
        assert_eq!(kpis.turns, 0.0);
        assert_eq!(kpis.on_hand, 0);
    }

    proptest! {
        #[test]
        fn projection_is_pure(
            on_hand in 0u64..1_000_000,
            capacity in 0.5f64..1.5,
            sqft in 0.0f64..20_000.0,
            budget in 0.0f64..1_000_000.0,
            receiving in 1u8..=5,
            staffing in any::<bool>(),
        ) {
            let base = baseline(on_hand, capacity);
            let config = ScenarioConfig::default()
                .with_mezzanine_sqft(sqft)
                .with_add_budget(budget)
                .with_constraints(ScenarioConstraints { staffing_ok: staffing, receiving_xpw: receiving, bays: 0 });
            let constants = ProjectionConstants::default();
            let first = project(&base, &config, &constants);
            let second = project(&base, &config, &constants);
            prop_assert_eq!(first.kpis.revenue.to_bits(), second.kpis.revenue.to_bits());
            prop_assert_eq!(first.kpis.turns.to_bits(), second.kpis.turns.to_bits());
            prop_assert_eq!(first.kpis.capacity_pct.to_bits(), second.kpis.capacity_pct.to_bits());
            prop_assert_eq!(first, second);
        }
    }
}
