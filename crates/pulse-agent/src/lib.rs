//! Pulse Agent - recommendation feed and instruction plumbing
//!
//! Connects the session store to its collaborators:
//! - [`FeedEvent`] schema for the named stream events
//! - [`FeedIngestor`] with snapshot fallback and stale-session checks
//! - [`FeedController`] for switching stores
//! - [`MockFeed`], a deterministic provider over bundled data
//! - [`CommandHandler`] for free-text instructions
//! - Narration text for the [`SpeechSink`]
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse_agent::{FeedController, FeedIngestor, MockFeed};
//! use pulse_core::{CopilotStore, PulseConfig};
//! use std::sync::Arc;
//!
//! let store = CopilotStore::shared(PulseConfig::default());
//! let feed = Arc::new(MockFeed::bundled()?);
//! let controller = FeedController::new(FeedIngestor::new(store.clone(), feed));
//!
//! controller.switch_store("ATL_050");
//! let report = controller.wait().await;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod commands;
pub mod controller;
pub mod event;
pub mod ingest;
pub mod mock;
pub mod narration;
pub mod source;

pub use commands::{CommandHandler, Handled};
pub use controller::FeedController;
pub use event::{CompleteBody, FeedEvent, RawEvent};
pub use ingest::{FeedIngestor, IngestEnd, IngestReport};
pub use mock::{MockFeed, MockStore};
pub use narration::{intro_narration, voice_snippet};
pub use source::{EventStream, FeedSource, InstructionProvider, LogSpeech, SpeechSink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
