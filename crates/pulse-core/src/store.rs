//! Shared copilot store
//!
//! Holds the [`SessionState`] behind a mutex and runs every command through
//! [`reduce`]. Commands from a feed carry a [`SessionGuard`]; once a new
//! session begins, commands tagged with an older generation are rejected
//! before they reach the state.

use crate::config::PulseConfig;
use crate::session::{reduce, Command, Outcome, SessionState};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Listener = Arc<dyn Fn(&SessionState) + Send + Sync>;

/// Token tying feed commands to the session that issued them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGuard {
    generation: u64,
    store_id: String,
}

impl SessionGuard {
    /// Generation this guard belongs to
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store the session was opened for
    #[inline]
    #[must_use]
    pub fn store_id(&self) -> &str {
        &self.store_id
    }
}

/// Single-writer store with change notification
pub struct CopilotStore {
    state: Mutex<SessionState>,
    generation: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
    config: PulseConfig,
}

impl CopilotStore {
    /// Create idle store
    #[must_use]
    pub fn new(config: PulseConfig) -> Self {
        Self {
            state: Mutex::new(SessionState::new(&config)),
            generation: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Create idle store behind an [`Arc`]
    #[must_use]
    pub fn shared(config: PulseConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Configuration the store was built with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    /// Call `listener` after every state change
    ///
    /// Listeners run while the state lock is held and must not dispatch.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// Current session generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// True while `guard` belongs to the current session
    #[inline]
    #[must_use]
    pub fn is_current(&self, guard: &SessionGuard) -> bool {
        guard.generation == self.generation()
    }

    /// Guard for the session currently open, if any
    #[must_use]
    pub fn current_guard(&self) -> Option<SessionGuard> {
        let state = self.state.lock();
        state.store_id().map(|store_id| SessionGuard {
            generation: self.generation(),
            store_id: store_id.to_string(),
        })
    }

    /// Invalidate outstanding guards and start a session for `store_id`
    pub fn begin_session(&self, store_id: impl Into<String>) -> SessionGuard {
        let store_id = store_id.into();
        let mut state = self.state.lock();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let outcome = reduce(
            &mut state,
            Command::BeginSession {
                store_id: store_id.clone(),
            },
            Utc::now(),
        );
        self.notify(&state, &outcome);
        tracing::debug!(store = %store_id, generation, "Session generation advanced");
        SessionGuard {
            generation,
            store_id,
        }
    }

    /// Invalidate outstanding guards and go idle
    pub fn end_session(&self) {
        let mut state = self.state.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let outcome = reduce(&mut state, Command::EndSession, Utc::now());
        self.notify(&state, &outcome);
    }

    /// Run `command` against the current session
    pub fn dispatch(&self, command: Command) -> Outcome {
        let mut state = self.state.lock();
        let name = command.name();
        let outcome = reduce(&mut state, command, Utc::now());
        tracing::trace!(command = name, ?outcome, "Dispatched");
        self.notify(&state, &outcome);
        outcome
    }

    /// Run `command` if `guard` still belongs to the current session
    pub fn dispatch_for(&self, guard: &SessionGuard, command: Command) -> Outcome {
        let mut state = self.state.lock();
        // Generation only advances under the state lock
        if !self.is_current(guard) {
            tracing::debug!(
                command = command.name(),
                store = %guard.store_id,
                generation = guard.generation,
                "Discarding stale command"
            );
            return Outcome::Stale;
        }
        let name = command.name();
        let outcome = reduce(&mut state, command, Utc::now());
        tracing::trace!(command = name, ?outcome, "Dispatched");
        self.notify(&state, &outcome);
        outcome
    }

    /// Read the state under the lock
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&*self.state.lock())
    }

    /// Clone of the current state
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    fn notify(&self, state: &SessionState, outcome: &Outcome) {
        if !outcome.is_changed() {
            return;
        }
        let listeners: Vec<Listener> = self.listeners.lock().clone();
        for listener in listeners {
            listener(state);
        }
    }
}

impl std::fmt::Debug for CopilotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopilotStore")
            .field("generation", &self.generation())
            .field("listeners", &self.listeners.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FeedStatus;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn stale_guard_is_rejected() {
        let store = CopilotStore::new(PulseConfig::default());
        let old = store.begin_session("ATL_050");
        let current = store.begin_session("SEA_014");

        assert!(!store.is_current(&old));
        assert_eq!(store.dispatch_for(&old, Command::Complete), Outcome::Stale);
        assert_eq!(store.read(SessionState::status), FeedStatus::Listening);

        assert_eq!(store.dispatch_for(&current, Command::Complete), Outcome::Changed);
        assert_eq!(store.read(SessionState::status), FeedStatus::Complete);
        assert_eq!(store.read(|s| s.store_id().map(str::to_string)), Some("SEA_014".into()));
    }

    #[test]
    fn end_session_invalidates_guard() {
        let store = CopilotStore::new(PulseConfig::default());
        let guard = store.begin_session("ATL_050");
        assert_eq!(store.current_guard(), Some(guard.clone()));
        store.end_session();
        assert_eq!(store.dispatch_for(&guard, Command::Complete), Outcome::Stale);
        assert_eq!(store.read(SessionState::status), FeedStatus::Idle);
        assert!(store.current_guard().is_none());
    }

    #[test]
    fn listeners_fire_on_change_only() {
        let store = CopilotStore::new(PulseConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        store.begin_session("ATL_050");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let outcome = store.dispatch(Command::Apply {
            action_id: "missing".into(),
        });
        assert!(!outcome.is_changed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
