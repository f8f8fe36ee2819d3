//! Pulse Model
//!
//! Plain data records exchanged between the recommendation feed, the
//! simulation state and the presentation layer:
//! - Store identity, totals and the per-SKU reference rows
//! - [`CategoryMix`] and the session [`Baseline`]
//! - Recommended [`Action`]s and their [`ActionStatus`]
//! - Narration entries and [`ConversationMessage`]s
//! - Snapshot and instruction payloads
//!
//! Records arriving from a provider are decoded with `serde` and then checked
//! with the `validate` methods; a record that fails validation is a
//! [`PayloadError`] and is dropped by the caller rather than merged.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod action;
mod conversation;
mod error;
mod payload;
mod store;

pub use action::{
    new_action_id, Action, ActionStatus, AddCandidate, RemoveCandidate, Severity,
};
pub use conversation::{
    new_message_id, ConversationMessage, ConversationSnippet, NarrationEntry, Role, Tone,
};
pub use error::PayloadError;
pub use payload::{InstructionRequest, InstructionResponse, MetaPayload, SnapshotPayload};
pub use store::{
    inventory_health, inventory_health_with_penalty, Baseline, CategoryMix, CategorySummary,
    SkuRow, StoreMeta, StoreTotals, DEFAULT_HEALTH_PENALTY,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
