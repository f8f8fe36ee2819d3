//! Local intent parser
//!
//! Short commands are handled without the instruction provider. Matching is
//! case-insensitive and the first rule that matches wins:
//! 1. `dismiss`
//! 2. `apply`, `approve` or `do it`
//! 3. `capacity`/`cap` followed by a two or three digit number
//! 4. `reset`
//!
//! Anything else is delegated.

use once_cell::sync::Lazy;
use regex::Regex;

static CAPACITY_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(capacity|cap)[^0-9]*(\d{2,3})").ok());

/// Parsed user instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Dismiss the first actionable recommendation
    Dismiss,
    /// Apply the first actionable recommendation
    Apply,
    /// Target this capacity percentage
    TargetCapacity(u32),
    /// Clear the override ledger
    Reset,
    /// Forward to the instruction provider
    Delegate,
}

impl Intent {
    /// True when the intent is handled locally
    #[inline]
    #[must_use]
    pub fn is_local(self) -> bool {
        !matches!(self, Self::Delegate)
    }
}

/// Classify `text`
#[must_use]
pub fn parse_intent(text: &str) -> Intent {
    let lower = text.trim().to_lowercase();
    if lower.contains("dismiss") {
        return Intent::Dismiss;
    }
    if ["apply", "approve", "do it"].iter().any(|k| lower.contains(k)) {
        return Intent::Apply;
    }
    if let Some(pct) = capacity_target(&lower) {
        return Intent::TargetCapacity(pct);
    }
    if lower.contains("reset") {
        return Intent::Reset;
    }
    Intent::Delegate
}

fn capacity_target(lower: &str) -> Option<u32> {
    let captures = CAPACITY_PATTERN.as_ref()?.captures(lower)?;
    captures.get(2)?.as_str().parse().ok()
}
