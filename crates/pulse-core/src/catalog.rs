//! Action catalog
//!
//! Known actions keyed by id, plus a status map that outlives them:
//! settling an action removes its record from the catalog but keeps its
//! terminal status, so a re-ingested copy can never regress to `pending`.

use crate::error::LifecycleError;
use crate::lifecycle::validate_transition;
use indexmap::IndexMap;
use pulse_model::{Action, ActionStatus};
use serde::{Deserialize, Serialize};

/// How an upsert landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// New id, status set to `pending`
    Inserted,
    /// Known id, fields replaced, status untouched
    Updated,
    /// Id already settled; record dropped, status untouched
    Settled(ActionStatus),
}

/// Actions and their tracked statuses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCatalog {
    actions: IndexMap<String, Action>,
    statuses: IndexMap<String, ActionStatus>,
    active_review: Option<String>,
}

impl ActionCatalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge `action`
    ///
    /// A first sighting starts at `pending`. A known id keeps whatever status
    /// it has, terminal ones included.
    pub fn upsert(&mut self, action: Action) -> Upsert {
        let id = action.id.clone();
        let outcome = match self.statuses.get(&id).copied() {
            None => {
                self.statuses.insert(id.clone(), ActionStatus::Pending);
                Upsert::Inserted
            }
            Some(status) if status.is_terminal() => Upsert::Settled(status),
            Some(_) => Upsert::Updated,
        };
        // Settled records stay out of the live map
        if !matches!(outcome, Upsert::Settled(_)) {
            self.actions.insert(id, action);
        }
        outcome
    }

    /// Record for `id`, if live
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Action> {
        self.actions.get(id)
    }

    /// Tracked status for `id`, live or settled
    #[inline]
    #[must_use]
    pub fn status(&self, id: &str) -> Option<ActionStatus> {
        self.statuses.get(id).copied()
    }

    /// Every tracked status, in first-seen order
    pub fn statuses(&self) -> impl Iterator<Item = (&str, ActionStatus)> {
        self.statuses.iter().map(|(id, s)| (id.as_str(), *s))
    }

    /// Live actions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    /// Number of live actions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no live action remains
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Non-terminal actions, most severe first, otherwise in insertion order
    #[must_use]
    pub fn actionable(&self) -> Vec<&Action> {
        let mut view: Vec<&Action> = self
            .actions
            .values()
            .filter(|a| !self.status(&a.id).is_some_and(ActionStatus::is_terminal))
            .collect();
        view.sort_by_key(|a| a.severity);
        view
    }

    /// Head of [`ActionCatalog::actionable`]
    #[must_use]
    pub fn first_actionable(&self) -> Option<&Action> {
        self.actionable().into_iter().next()
    }

    /// Action under review
    #[must_use]
    pub fn active_review(&self) -> Option<&Action> {
        self.active_review.as_deref().and_then(|id| self.get(id))
    }

    /// Move `id` to `to`, returning the previous status
    ///
    /// Opening a review repoints the active-review pointer; leaving
    /// `in_review` clears it when it points at `id`. Settling removes the
    /// live record.
    ///
    /// # Errors
    /// Returns [`LifecycleError`] for an unknown id or a transition outside
    /// the status table
    pub fn transition(
        &mut self,
        id: &str,
        to: ActionStatus,
    ) -> Result<ActionStatus, LifecycleError> {
        let from = self
            .status(id)
            .ok_or_else(|| LifecycleError::UnknownAction(id.to_string()))?;
        validate_transition(from, to)?;
        self.statuses.insert(id.to_string(), to);

        if to == ActionStatus::InReview {
            self.active_review = Some(id.to_string());
        } else if self.active_review.as_deref() == Some(id) {
            self.active_review = None;
        }
        if to.is_terminal() {
            self.actions.shift_remove(id);
        }
        tracing::debug!(action = %id, %from, %to, "Action status changed");
        Ok(from)
    }

    /// Drop the live record for `id`, keeping its status
    pub fn remove(&mut self, id: &str) -> Option<Action> {
        if self.active_review.as_deref() == Some(id) {
            self.active_review = None;
        }
        self.actions.shift_remove(id)
    }

    /// Forget every action and status
    pub fn clear(&mut self) {
        self.actions.clear();
        self.statuses.clear();
        self.active_review = None;
    }
}
