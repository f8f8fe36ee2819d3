//! Reference constants for adjustments and the effective summary
//!
//! The defaults are fixed business constants. Changing any of them changes
//! the numbers shown to store operators and needs sign-off.

use crate::error::LedgerError;
use pulse_model::DEFAULT_HEALTH_PENALTY;
use serde::{Deserialize, Serialize};

/// Tunable constants used by the adjustment engine and summary derivation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerTuning {
    /// Capacity relief per unit of shift ratio
    pub capacity_relief_per_shift: f64,
    /// Minimum capacity relief for any positive shift
    pub min_capacity_relief: f64,
    /// Fraction of on-hand units relieved per unit of shift ratio
    pub on_hand_relief_per_shift: f64,
    /// Lowest effective capacity ratio (minimum occupied bays)
    pub capacity_floor: f64,
    /// Health score penalty per unit of capacity deviation
    pub health_penalty: f64,
}

impl LedgerTuning {
    /// Create default tuning
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With capacity floor
    #[inline]
    #[must_use]
    pub fn with_capacity_floor(mut self, floor: f64) -> Self {
        self.capacity_floor = floor;
        self
    }

    /// Check every constant is usable
    ///
    /// # Errors
    /// Returns [`LedgerError`] naming the first invalid constant
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !(self.capacity_floor > 0.0 && self.capacity_floor <= 1.0) {
            return Err(LedgerError::InvalidCapacityFloor(self.capacity_floor));
        }
        let constants = [
            ("capacity_relief_per_shift", self.capacity_relief_per_shift),
            ("min_capacity_relief", self.min_capacity_relief),
            ("on_hand_relief_per_shift", self.on_hand_relief_per_shift),
            ("health_penalty", self.health_penalty),
        ];
        for (name, value) in constants {
            if !value.is_finite() || value < 0.0 {
                return Err(LedgerError::InvalidConstant { name, value });
            }
        }
        Ok(())
    }
}

impl Default for LedgerTuning {
    fn default() -> Self {
        Self {
            capacity_relief_per_shift: 0.2,
            min_capacity_relief: 0.05,
            on_hand_relief_per_shift: 0.05,
            capacity_floor: 0.6,
            health_penalty: DEFAULT_HEALTH_PENALTY,
        }
    }
}
