//! Pulse Scenario
//!
//! What-if projections over a store baseline. Nothing here touches the
//! override ledger.
//!
//! - [`ScenarioConfig`]: the knobs, merged field by field from a [`ScenarioPatch`]
//! - [`ScenarioPreset`]: canned configurations
//! - [`project`]: pure `(Baseline, ScenarioConfig) -> ScenarioKpis`
//! - [`WhatIfSession`]: projection mode flag plus cached KPIs

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod constants;
mod error;
mod projector;
mod session;

pub use config::{
    ConstraintsPatch, ScenarioConfig, ScenarioConstraints, ScenarioPatch, ScenarioPreset,
    UpliftPreset,
};
pub use constants::{ProjectionConstants, UpliftTable};
pub use error::ScenarioError;
pub use projector::{project, Projection, ScenarioKpis};
pub use session::WhatIfSession;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
