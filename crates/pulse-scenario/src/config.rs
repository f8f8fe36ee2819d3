//! Scenario knobs, patches and presets

use crate::error::ScenarioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sales uplift assumption
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpliftPreset {
    /// Low uplift
    Conservative,
    /// Reference uplift
    #[default]
    Base,
    /// High uplift
    Aggressive,
}

impl fmt::Display for UpliftPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Conservative => "conservative",
            Self::Base => "base",
            Self::Aggressive => "aggressive",
        })
    }
}

impl FromStr for UpliftPreset {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "base" => Ok(Self::Base),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(ScenarioError::UnknownUplift(s.to_string())),
        }
    }
}

/// Operational constraints of the scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConstraints {
    /// Staffing can absorb the change
    #[serde(rename = "staffingOK")]
    pub staffing_ok: bool,
    /// Receiving deliveries per week, 1-5
    pub receiving_xpw: u8,
    /// Extra bays
    pub bays: u32,
}

impl Default for ScenarioConstraints {
    fn default() -> Self {
        Self {
            staffing_ok: true,
            receiving_xpw: 3,
            bays: 0,
        }
    }
}

/// Complete what-if configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioConfig {
    /// Added mezzanine floor area
    pub mezzanine_sqft: f64,
    /// Added capital budget
    pub add_budget: f64,
    /// Operational constraints
    pub constraints: ScenarioConstraints,
    /// Uplift assumption
    pub uplift_preset: UpliftPreset,
}

impl ScenarioConfig {
    /// With mezzanine area
    #[inline]
    #[must_use]
    pub fn with_mezzanine_sqft(mut self, sqft: f64) -> Self {
        self.mezzanine_sqft = sqft;
        self
    }

    /// With capital budget
    #[inline]
    #[must_use]
    pub fn with_add_budget(mut self, budget: f64) -> Self {
        self.add_budget = budget;
        self
    }

    /// With constraints
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: ScenarioConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// With uplift preset
    #[inline]
    #[must_use]
    pub fn with_uplift(mut self, preset: UpliftPreset) -> Self {
        self.uplift_preset = preset;
        self
    }

    /// Check the knob ranges
    ///
    /// # Errors
    /// Returns [`ScenarioError`] for a negative or non-finite area or budget,
    /// or a receiving frequency outside 1-5
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (field, value) in [
            ("mezzanineSqft", self.mezzanine_sqft),
            ("addBudget", self.add_budget),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScenarioError::InvalidKnob { field, value });
            }
        }
        if !(1..=5).contains(&self.constraints.receiving_xpw) {
            return Err(ScenarioError::InvalidReceiving(self.constraints.receiving_xpw));
        }
        Ok(())
    }

    /// Merge `patch` field by field, returning the merged config
    ///
    /// # Errors
    /// Returns [`ScenarioError`] when the merged config is invalid; `self`
    /// is left untouched in that case
    pub fn merged(&self, patch: &ScenarioPatch) -> Result<Self, ScenarioError> {
        let mut next = *self;
        if let Some(sqft) = patch.mezzanine_sqft {
            next.mezzanine_sqft = sqft;
        }
        if let Some(budget) = patch.add_budget {
            next.add_budget = budget;
        }
        if let Some(c) = &patch.constraints {
            if let Some(staffing_ok) = c.staffing_ok {
                next.constraints.staffing_ok = staffing_ok;
            }
            if let Some(receiving_xpw) = c.receiving_xpw {
                next.constraints.receiving_xpw = receiving_xpw;
            }
            if let Some(bays) = c.bays {
                next.constraints.bays = bays;
            }
        }
        if let Some(preset) = patch.uplift_preset {
            next.uplift_preset = preset;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial constraints update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintsPatch {
    /// New staffing flag
    #[serde(rename = "staffingOK")]
    pub staffing_ok: Option<bool>,
    /// New receiving frequency
    pub receiving_xpw: Option<u8>,
    /// New bay count
    pub bays: Option<u32>,
}

/// Partial scenario update; `None` keeps the current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPatch {
    /// New mezzanine area
    pub mezzanine_sqft: Option<f64>,
    /// New budget
    pub add_budget: Option<f64>,
    /// Constraint changes
    pub constraints: Option<ConstraintsPatch>,
    /// New uplift preset
    pub uplift_preset: Option<UpliftPreset>,
}

impl ScenarioPatch {
    /// True when nothing would change
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<ScenarioConfig> for ScenarioPatch {
    fn from(config: ScenarioConfig) -> Self {
        Self {
            mezzanine_sqft: Some(config.mezzanine_sqft),
            add_budget: Some(config.add_budget),
            constraints: Some(ConstraintsPatch {
                staffing_ok: Some(config.constraints.staffing_ok),
                receiving_xpw: Some(config.constraints.receiving_xpw),
                bays: Some(config.constraints.bays),
            }),
            uplift_preset: Some(config.uplift_preset),
        }
    }
}

/// Canned scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioPreset {
    /// Add a 1000 sqft mezzanine
    Mezzanine,
    /// Spend on capex with aggressive uplift
    Budget,
    /// Faster replenishment only
    Replenishment,
}

impl ScenarioPreset {
    /// Every preset, in display order
    pub const ALL: [Self; 3] = [Self::Mezzanine, Self::Budget, Self::Replenishment];

    /// Configuration this preset stands for
    #[must_use]
    pub fn config(self) -> ScenarioConfig {
        match self {
            Self::Mezzanine => ScenarioConfig {
                mezzanine_sqft: 1_000.0,
                add_budget: 50_000.0,
                constraints: ScenarioConstraints {
                    staffing_ok: true,
                    receiving_xpw: 2,
                    bays: 8,
                },
                uplift_preset: UpliftPreset::Base,
            },
            Self::Budget => ScenarioConfig {
                mezzanine_sqft: 0.0,
                add_budget: 250_000.0,
                constraints: ScenarioConstraints {
                    staffing_ok: true,
                    receiving_xpw: 3,
                    bays: 5,
                },
                uplift_preset: UpliftPreset::Aggressive,
            },
            Self::Replenishment => ScenarioConfig {
                mezzanine_sqft: 0.0,
                add_budget: 0.0,
                constraints: ScenarioConstraints {
                    staffing_ok: true,
                    receiving_xpw: 3,
                    bays: 0,
                },
                uplift_preset: UpliftPreset::Conservative,
            },
        }
    }
}

impl fmt::Display for ScenarioPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mezzanine => "mezzanine",
            Self::Budget => "budget",
            Self::Replenishment => "replenishment",
        })
    }
}

impl FromStr for ScenarioPreset {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScenarioError::UnknownPreset(s.to_string()))
    }
}
