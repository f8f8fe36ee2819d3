//! Reference constants for KPI projection

use crate::config::UpliftPreset;
use crate::error::ScenarioError;
use serde::{Deserialize, Serialize};

/// Sales uplift fraction per [`UpliftPreset`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpliftTable {
    /// Conservative uplift
    pub conservative: f64,
    /// Base uplift
    pub base: f64,
    /// Aggressive uplift
    pub aggressive: f64,
}

impl UpliftTable {
    /// Uplift fraction for `preset`
    #[inline]
    #[must_use]
    pub fn factor(&self, preset: UpliftPreset) -> f64 {
        match preset {
            UpliftPreset::Conservative => self.conservative,
            UpliftPreset::Base => self.base,
            UpliftPreset::Aggressive => self.aggressive,
        }
    }
}

impl Default for UpliftTable {
    fn default() -> Self {
        Self {
            conservative: 0.03,
            base: 0.07,
            aggressive: 0.12,
        }
    }
}

/// Fixed inputs of the projection formulas
///
/// The defaults are business reference values. Changing one changes every
/// projected KPI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConstants {
    /// Reference sales floor area the mezzanine is added to
    pub store_sqft: f64,
    /// Revenue proxy per on-hand unit
    pub revenue_per_unit: f64,
    /// Reference inventory turns
    pub base_turns: f64,
    /// Budget that yields `ln(2)` of capex effect
    pub capex_scale: f64,
    /// Weight of the capex log term
    pub capex_weight: f64,
    /// Average inventory relative to expanded on-hand
    pub inventory_factor: f64,
    /// Capacity ratio relative to expanded capacity
    pub capacity_factor: f64,
    /// Uplift per preset
    pub uplift: UpliftTable,
}

impl ProjectionConstants {
    /// Check every constant is usable
    ///
    /// # Errors
    /// Returns [`ScenarioError::InvalidConstant`] naming the first bad value
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let positive = [
            ("store_sqft", self.store_sqft),
            ("revenue_per_unit", self.revenue_per_unit),
            ("capex_scale", self.capex_scale),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScenarioError::InvalidConstant { name, value });
            }
        }
        let non_negative = [
            ("base_turns", self.base_turns),
            ("capex_weight", self.capex_weight),
            ("inventory_factor", self.inventory_factor),
            ("capacity_factor", self.capacity_factor),
            ("uplift.conservative", self.uplift.conservative),
            ("uplift.base", self.uplift.base),
            ("uplift.aggressive", self.uplift.aggressive),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ScenarioError::InvalidConstant { name, value });
            }
        }
        Ok(())
    }
}

impl Default for ProjectionConstants {
    fn default() -> Self {
        Self {
            store_sqft: 8_000.0,
            revenue_per_unit: 45.0,
            base_turns: 4.2,
            capex_scale: 100_000.0,
            capex_weight: 0.15,
            inventory_factor: 0.95,
            capacity_factor: 0.92,
            uplift: UpliftTable::default(),
        }
    }
}
