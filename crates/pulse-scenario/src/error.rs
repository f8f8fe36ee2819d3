//! Scenario error types

/// Invalid scenario knobs or projection constants
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    /// Receiving frequency outside 1-5 per week
    #[error("receiving frequency must be 1-5 per week, got {0}")]
    InvalidReceiving(u8),

    /// Knob negative or not finite
    #[error("scenario field `{field}` must be finite and non-negative, got {value}")]
    InvalidKnob {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// Projection constant unusable
    #[error("projection constant `{name}` is invalid: {value}")]
    InvalidConstant {
        /// Constant name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Preset name not recognised
    #[error("unknown scenario preset: {0}")]
    UnknownPreset(String),

    /// Uplift preset name not recognised
    #[error("unknown uplift preset: {0}")]
    UnknownUplift(String),
}
