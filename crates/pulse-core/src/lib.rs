//! Pulse Core - store copilot session engine
//!
//! The single writer behind a store session:
//! - Reduces feed events and user commands into [`SessionState`]
//! - Tracks action statuses through the review/apply/dismiss lifecycle
//! - Keeps the de-duplicated conversation log
//! - Parses short local commands and synthesizes ad-hoc actions
//! - Shares state through [`CopilotStore`] with change notification and
//!   stale-session rejection
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse_core::{Command, CopilotStore, PulseConfig};
//!
//! let store = CopilotStore::shared(PulseConfig::default());
//! let guard = store.begin_session("ATL_050");
//! store.dispatch_for(&guard, Command::IngestSnapshot(snapshot));
//! store.dispatch_for(&guard, Command::Complete);
//!
//! let summary = store.read(|s| s.effective_summary());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod catalog;
pub mod config;
pub mod conversation;
pub mod error;
pub mod intent;
pub mod lifecycle;
pub mod session;
pub mod store;
pub mod synthesis;

// Re-exports for convenience
pub use catalog::{ActionCatalog, Upsert};
pub use config::{FeedConfig, PulseConfig, DEFAULT_STORE_ID};
pub use conversation::ConversationLog;
pub use error::{LifecycleError, PulseError, Result, TransportError};
pub use intent::{parse_intent, Intent};
pub use lifecycle::{allowed_transitions, validate_transition};
pub use session::{reduce, Command, FeedStatus, Ignored, Outcome, SessionState};
pub use store::{CopilotStore, SessionGuard};
pub use synthesis::{synthesize, SynthesisIntent};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Pulse Core
    pub use crate::{
        Command, CopilotStore, FeedStatus, Intent, Outcome, PulseConfig, SessionGuard,
        SessionState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
