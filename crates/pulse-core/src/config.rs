//! Copilot configuration
//!
//! Every field is optional in TOML; missing fields take the defaults below.
//!
//! ```toml
//! conversation_window = 40
//! instruction_history = 8
//!
//! [ledger]
//! capacity_floor = 0.6
//!
//! [projection]
//! store_sqft = 8000.0
//!
//! [feed]
//! store_id = "ATL_050"
//! event_delay_ms = 250
//! ```

use crate::error::{PulseError, Result};
use pulse_ledger::LedgerTuning;
use pulse_scenario::ProjectionConstants;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default store opened when none is given
pub const DEFAULT_STORE_ID: &str = "ATL_050";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Messages shown in the conversation window
    pub conversation_window: usize,
    /// Messages forwarded with a delegated instruction
    pub instruction_history: usize,
    /// Adjustment and summary constants
    pub ledger: LedgerTuning,
    /// Scenario projection constants
    pub projection: ProjectionConstants,
    /// Feed settings
    pub feed: FeedConfig,
}

impl PulseConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With conversation window
    #[inline]
    #[must_use]
    pub fn with_conversation_window(mut self, window: usize) -> Self {
        self.conversation_window = window;
        self
    }

    /// With instruction history length
    #[inline]
    #[must_use]
    pub fn with_instruction_history(mut self, count: usize) -> Self {
        self.instruction_history = count;
        self
    }

    /// With ledger tuning
    #[inline]
    #[must_use]
    pub fn with_ledger(mut self, ledger: LedgerTuning) -> Self {
        self.ledger = ledger;
        self
    }

    /// With feed settings
    #[inline]
    #[must_use]
    pub fn with_feed(mut self, feed: FeedConfig) -> Self {
        self.feed = feed;
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Returns [`PulseError::ConfigParse`] for invalid TOML, or the
    /// validation error
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// Returns [`PulseError::ConfigIo`] when the file cannot be read, or any
    /// error of [`PulseConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PulseError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`PulseError`] for a zero conversation window, a blank store
    /// id, or invalid ledger and projection constants
    pub fn validate(&self) -> Result<()> {
        if self.conversation_window == 0 {
            return Err(PulseError::Config(
                "conversation_window must be at least 1".into(),
            ));
        }
        if self.feed.store_id.trim().is_empty() {
            return Err(PulseError::Config("feed.store_id must not be blank".into()));
        }
        self.ledger.validate()?;
        self.projection.validate()?;
        Ok(())
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            conversation_window: 40,
            instruction_history: 8,
            ledger: LedgerTuning::default(),
            projection: ProjectionConstants::default(),
            feed: FeedConfig::default(),
        }
    }
}

/// Feed settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Store opened at startup
    pub store_id: String,
    /// Delay between mock feed events, zero for none
    pub event_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            store_id: DEFAULT_STORE_ID.to_string(),
            event_delay_ms: 0,
        }
    }
}
