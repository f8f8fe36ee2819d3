//! Action status machine
//!
//! ```text
//! pending ──> in_review ──> applied
//!    │  ^         │
//!    │  └─────────┤
//!    ├────────────┴───────> dismissed
//!    └────────────────────> applied
//! ```
//!
//! `applied` and `dismissed` have no outgoing transitions.

use crate::error::LifecycleError;
use pulse_model::ActionStatus;

/// Validates a status transition.
///
/// # Errors
/// Returns [`LifecycleError::IllegalTransition`] when `to` is not reachable
/// from `from` in one step
pub fn validate_transition(from: ActionStatus, to: ActionStatus) -> Result<(), LifecycleError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(LifecycleError::IllegalTransition { from, to })
    }
}

/// Statuses reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: ActionStatus) -> Vec<ActionStatus> {
    use ActionStatus::*;
    match from {
        Pending => vec![InReview, Applied, Dismissed],
        InReview => vec![Pending, Applied, Dismissed],
        Applied => vec![],
        Dismissed => vec![],
    }
}

fn allowed(from: ActionStatus, to: ActionStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn status() -> impl Strategy<Value = ActionStatus> {
        prop_oneof![
            Just(ActionStatus::Pending),
            Just(ActionStatus::InReview),
            Just(ActionStatus::Applied),
            Just(ActionStatus::Dismissed),
        ]
    }

    #[test]
    fn review_can_be_closed() {
        assert!(validate_transition(ActionStatus::InReview, ActionStatus::Pending).is_ok());
        assert!(validate_transition(ActionStatus::Pending, ActionStatus::InReview).is_ok());
    }

    #[test]
    fn pending_cannot_loop() {
        assert_eq!(
            validate_transition(ActionStatus::Pending, ActionStatus::Pending),
            Err(LifecycleError::IllegalTransition {
                from: ActionStatus::Pending,
                to: ActionStatus::Pending,
            })
        );
    }

    proptest! {
        #[test]
        fn terminal_statuses_are_final(to in status()) {
            prop_assert!(validate_transition(ActionStatus::Applied, to).is_err());
            prop_assert!(validate_transition(ActionStatus::Dismissed, to).is_err());
        }

        #[test]
        fn every_open_status_can_settle(from in status()) {
            if !from.is_terminal() {
                prop_assert!(validate_transition(from, ActionStatus::Applied).is_ok());
                prop_assert!(validate_transition(from, ActionStatus::Dismissed).is_ok());
            }
        }
    }
}
