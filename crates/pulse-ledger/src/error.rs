//! Ledger error types

/// Invalid ledger configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// Capacity floor outside `(0, 1]`
    #[error("capacity floor must be in (0, 1], got {0}")]
    InvalidCapacityFloor(f64),

    /// Constant negative or not finite
    #[error("ledger constant `{name}` must be finite and non-negative, got {value}")]
    InvalidConstant {
        /// Constant name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}
