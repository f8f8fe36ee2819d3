//! Pulse Ledger
//!
//! Accumulated overrides on top of a store's [`Baseline`](pulse_model::Baseline):
//! - [`OverrideLedger`]: per-category mix deltas, capacity and on-hand offsets
//! - [`AdjustmentEngine`]: converts an action into exactly one ledger update
//! - [`EffectiveSummary`]: baseline + ledger, renormalized and floored
//! - [`LedgerTuning`]: the reference constants behind both
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse_ledger::{AdjustmentEngine, EffectiveSummary, LedgerTuning, OverrideLedger};
//!
//! let engine = AdjustmentEngine::new(LedgerTuning::default());
//! let mut ledger = OverrideLedger::new();
//! engine.apply(&mut ledger, Some(&baseline), &action, None);
//!
//! let summary = EffectiveSummary::derive(&baseline, &ledger, engine.tuning());
//! assert!((summary.categories.total() - 1.0).abs() < 1e-6);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod adjustment;
mod effective;
mod error;
mod ledger;
mod tuning;

pub use adjustment::{AdjustmentEngine, ApplyOutcome, ShiftEffect};
pub use effective::EffectiveSummary;
pub use error::LedgerError;
pub use ledger::OverrideLedger;
pub use tuning::LedgerTuning;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
