//! Recommended actions
//!
//! An [`Action`] is a proposal to move part of the category mix from one
//! category to another, with SKU-level remove/add candidates. Its lifecycle
//! status is tracked outside the record so that re-ingesting the same id can
//! overwrite fields without touching the status.

use crate::error::PayloadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Generate an id for a locally synthesized action
#[inline]
#[must_use]
pub fn new_action_id() -> String {
    format!("action-{}", Ulid::new().to_string().to_lowercase())
}

/// Urgency of a recommendation.
///
/// Ordering follows urgency: `High < Medium < Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Lifecycle status of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Known, not yet looked at
    Pending,
    /// Opened for inspection
    InReview,
    /// Effect committed to the override ledger
    Applied,
    /// Rejected
    Dismissed,
}

impl ActionStatus {
    /// `Applied` and `Dismissed` admit no further transition
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Applied | Self::Dismissed)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::InReview => write!(f, "in_review"),
            ActionStatus::Applied => write!(f, "applied"),
            ActionStatus::Dismissed => write!(f, "dismissed"),
        }
    }
}

/// SKU proposed for removal from the source category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveCandidate {
    pub id: String,
    pub name: String,
    pub reason: String,
    pub ranking: u32,
    /// Share of bay capacity held, in whole percent
    pub capacity_pct: f64,
}

/// SKU proposed for addition to the target category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCandidate {
    pub id: String,
    pub name: String,
    pub fit_score: f64,
    pub rationale: String,
}

/// A recommended stock-rebalancing action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_summary: Option<String>,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: String,
    /// Percentage of mix to move, 0-100
    pub shift_pct: f64,
    pub source_category: String,
    pub target_category: String,
    #[serde(default)]
    pub remove: Vec<RemoveCandidate>,
    #[serde(default)]
    pub add: Vec<AddCandidate>,
}

impl Action {
    /// Shift ratio in `[0, ..)`: negative shifts count as no shift
    #[inline]
    #[must_use]
    pub fn shift_ratio(&self) -> f64 {
        self.shift_pct.max(0.0) / 100.0
    }

    /// One-line description used in conversation messages
    #[must_use]
    pub fn describe_shift(&self) -> String {
        format!(
            "{}% from {} to {}",
            format_pct(self.shift_pct),
            self.source_category,
            self.target_category
        )
    }

    /// Check the fields a decoded provider record must carry
    ///
    /// # Errors
    /// Returns [`PayloadError`] for an empty id or category, or a shift
    /// outside 0-100
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.id.trim().is_empty() {
            return Err(PayloadError::MissingField {
                record: "action",
                field: "id",
            });
        }
        if self.source_category.trim().is_empty() {
            return Err(PayloadError::MissingField {
                record: "action",
                field: "sourceCategory",
            });
        }
        if self.target_category.trim().is_empty() {
            return Err(PayloadError::MissingField {
                record: "action",
                field: "targetCategory",
            });
        }
        if !self.shift_pct.is_finite() || !(0.0..=100.0).contains(&self.shift_pct) {
            return Err(PayloadError::OutOfRange {
                record: "action",
                field: "shiftPct",
                value: self.shift_pct,
            });
        }
        Ok(())
    }
}

fn format_pct(pct: f64) -> String {
    if pct.fract() == 0.0 {
        format!("{pct:.0}")
    } else {
        format!("{pct:.1}")
    }
}
