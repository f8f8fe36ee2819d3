//! What-if session: projection mode, current knobs and cached KPIs

use crate::config::{ScenarioConfig, ScenarioPatch, ScenarioPreset};
use crate::constants::ProjectionConstants;
use crate::error::ScenarioError;
use crate::projector::{project, ScenarioKpis};
use pulse_model::Baseline;
use serde::{Deserialize, Serialize};

/// Projection mode state
///
/// KPIs are cached while the mode is active and recomputed on every knob
/// change. The baseline is owned elsewhere and passed in on each call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfSession {
    config: ScenarioConfig,
    active: bool,
    kpis: Option<ScenarioKpis>,
    #[serde(skip)]
    constants: ProjectionConstants,
}

impl WhatIfSession {
    /// Create inactive session using `constants`
    #[inline]
    #[must_use]
    pub fn new(constants: ProjectionConstants) -> Self {
        Self {
            constants,
            ..Self::default()
        }
    }

    /// Current knobs
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Projection mode flag
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Cached KPIs; `None` when inactive or without a baseline
    #[inline]
    #[must_use]
    pub fn kpis(&self) -> Option<&ScenarioKpis> {
        self.kpis.as_ref()
    }

    /// Turn projection mode on and compute KPIs
    pub fn activate(&mut self, baseline: Option<&Baseline>) -> Option<&ScenarioKpis> {
        self.active = true;
        self.recompute(baseline);
        self.kpis.as_ref()
    }

    /// Merge `patch` into the knobs, recomputing when active
    ///
    /// # Errors
    /// Returns [`ScenarioError`] for out-of-range knobs; the session is
    /// left unchanged
    pub fn update(
        &mut self,
        patch: &ScenarioPatch,
        baseline: Option<&Baseline>,
    ) -> Result<Option<&ScenarioKpis>, ScenarioError> {
        self.config = self.config.merged(patch)?;
        if self.active {
            self.recompute(baseline);
        }
        Ok(self.kpis.as_ref())
    }

    /// Replace the knobs with `preset` and turn projection mode on
    pub fn apply_preset(
        &mut self,
        preset: ScenarioPreset,
        baseline: Option<&Baseline>,
    ) -> Option<&ScenarioKpis> {
        tracing::debug!(%preset, "Applying scenario preset");
        self.config = preset.config();
        self.activate(baseline)
    }

    /// Recompute after the baseline changed
    pub fn refresh(&mut self, baseline: Option<&Baseline>) {
        if self.active {
            self.recompute(baseline);
        }
    }

    /// Default knobs, no cached KPIs, mode off
    pub fn reset(&mut self) {
        self.config = ScenarioConfig::default();
        self.kpis = None;
        self.active = false;
    }

    fn recompute(&mut self, baseline: Option<&Baseline>) {
        self.kpis = baseline.map(|b| project(b, &self.config, &self.constants).kpis);
        if let Some(kpis) = &self.kpis {
            tracing::debug!(
                revenue = kpis.revenue,
                turns = kpis.turns,
                capacity_pct = kpis.capacity_pct,
                "Scenario recomputed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConstraintsPatch;
    use pulse_model::CategoryMix;

    fn baseline() -> Baseline {
        Baseline::new(CategoryMix::from_pairs([("A", 1.0)]), 1.0, 8_000, Vec::new())
    }

    #[test]
    fn inactive_session_does_not_compute() {
        let mut session = WhatIfSession::default();
        let kpis = session
            .update(
                &ScenarioPatch {
                    mezzanine_sqft: Some(500.0),
                    ..ScenarioPatch::default()
                },
                Some(&baseline()),
            )
            .unwrap();
        assert!(kpis.is_none());
        assert_eq!(session.config().mezzanine_sqft, 500.0);
    }

    #[test]
    fn active_session_recomputes_on_change() {
        let mut session = WhatIfSession::default();
        let first = *session
            .apply_preset(ScenarioPreset::Mezzanine, Some(&baseline()))
            .unwrap();
        assert_eq!(first.on_hand, 8_550);

        let patch = ScenarioPatch {
            constraints: Some(ConstraintsPatch {
                receiving_xpw: Some(3),
                ..ConstraintsPatch::default()
            }),
            ..ScenarioPatch::default()
        };
        let second = *session.update(&patch, Some(&baseline())).unwrap().unwrap();
        assert!(second.revenue > first.revenue);
    }

    #[test]
    fn rejected_patch_keeps_state() {
        let mut session = WhatIfSession::default();
        session.apply_preset(ScenarioPreset::Budget, Some(&baseline()));
        let before = session.clone();
        let bad = ScenarioPatch {
            add_budget: Some(f64::NAN),
            ..ScenarioPatch::default()
        };
        assert!(session.update(&bad, Some(&baseline())).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn reset_turns_mode_off() {
        let mut session = WhatIfSession::default();
        session.apply_preset(ScenarioPreset::Replenishment, Some(&baseline()));
        assert!(session.is_active());
        session.reset();
        assert!(!session.is_active());
        assert!(session.kpis().is_none());
        assert_eq!(*session.config(), ScenarioConfig::default());
    }

    #[test]
    fn missing_baseline_yields_no_kpis() {
        let mut session = WhatIfSession::default();
        assert!(session.activate(None).is_none());
        session.refresh(Some(&baseline()));
        assert!(session.kpis().is_some());
    }
}
