//! Error types for Pulse Core
//!
//! Covers:
//! - Configuration loading and validation
//! - Illegal action status transitions
//! - Transport failures of the feed and instruction providers
//! - Wrapped model, ledger and scenario errors
//!
//! Steady-state conditions (missing baseline, duplicate message, double
//! apply) are not errors; the reducer reports them through
//! [`Outcome`](crate::session::Outcome).

use pulse_ledger::LedgerError;
use pulse_model::{ActionStatus, PayloadError};
use pulse_scenario::ScenarioError;
use std::path::PathBuf;

/// Main Pulse error type
#[derive(Debug, thiserror::Error)]
pub enum PulseError {
    /// Configuration value out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file unreadable
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file not valid TOML
    #[error("cannot parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid ledger tuning
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Invalid scenario knobs or constants
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    /// Malformed provider payload
    #[error("payload error: {0}")]
    Payload(#[from] PayloadError),

    /// Illegal status transition
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Feed or provider unreachable
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl PulseError {
    /// Check if the session can carry on after this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Payload(_) | Self::Lifecycle(_)
        )
    }
}

/// Action status machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Transition not in the table
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        /// Current status
        from: ActionStatus,
        /// Requested status
        to: ActionStatus,
    },

    /// No status recorded for this id
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

/// Feed and provider transport failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Stream could not be opened
    #[error("cannot open feed: {0}")]
    Connect(String),

    /// Stream failed mid-way
    #[error("feed stream failed: {0}")]
    Stream(String),

    /// Stream closed before `complete`
    #[error("feed ended before completion")]
    EndedEarly,

    /// Snapshot fetch failed
    #[error("snapshot fetch failed: {0}")]
    Fetch(String),

    /// Instruction provider failed
    #[error("instruction provider failed: {0}")]
    Provider(String),

    /// Speech synthesis failed
    #[error("speech synthesis failed: {0}")]
    Speech(String),
}

/// Result type alias for Pulse operations
pub type Result<T> = std::result::Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_recoverable() {
        let err = PulseError::from(TransportError::EndedEarly);
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "transport error: feed ended before completion"
        );
    }

    #[test]
    fn config_errors_are_fatal() {
        assert!(!PulseError::Config("window is zero".into()).is_recoverable());
        assert!(!PulseError::from(ScenarioError::InvalidReceiving(9)).is_recoverable());
    }

    #[test]
    fn lifecycle_error_names_statuses() {
        let err = LifecycleError::IllegalTransition {
            from: ActionStatus::Applied,
            to: ActionStatus::Pending,
        };
        assert_eq!(err.to_string(), "illegal status transition: applied -> pending");
    }
}
