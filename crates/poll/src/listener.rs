//! Listener interface and per-task listener registry

use std::sync::{Arc, Weak};

use crate::error::PollError;
use crate::state::PollState;

/// Callbacks for the outcome of a poll operation
///
/// All methods default to no-ops so implementors only handle the
/// events they care about. Callbacks fire on the background thread
/// that completed the fetch; implementations must be thread-safe.
pub trait PollListener: Send + Sync {
    /// The fetch this listener triggered has started
    fn on_start(&self) {}

    /// A fetch was already in flight; this listener joined it
    fn on_already_polling(&self) {}

    /// The fetch and merge completed; `added` items are new
    fn on_success(&self, added: usize) {
        let _ = added;
    }

    /// The fetch or merge failed
    fn on_error(&self, error: &PollError) {
        let _ = error;
    }

    /// The recorded content state changed
    fn on_state_changed(&self, state: PollState) {
        let _ = state;
    }

    /// No older items remain; no fetch was made
    fn on_exhausted(&self) {}
}

/// Weakly-held, identity-deduplicated listeners for one in-flight task
///
/// Listeners are held by `Weak` reference so an owner that dropped its
/// `Arc` is silently skipped at fan-out. Registering the same `Arc`
/// twice contributes one entry. The registry is drained wholesale
/// after a single dispatch pass; listeners do not persist across
/// operations.
pub(crate) struct ListenerRegistry {
    entries: Vec<Weak<dyn PollListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a listener, deduplicated by `Arc` pointer identity
    pub fn add(&mut self, listener: &Arc<dyn PollListener>) {
        let weak = Arc::downgrade(listener);
        if !self.entries.iter().any(|entry| entry.ptr_eq(&weak)) {
            self.entries.push(weak);
        }
    }

    /// Drain all entries for a single fan-out pass
    pub fn take(&mut self) -> Vec<Weak<dyn PollListener>> {
        std::mem::take(&mut self.entries)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Upgrade the drained entries, skipping listeners whose owner is gone
pub(crate) fn live(entries: &[Weak<dyn PollListener>]) -> impl Iterator<Item = Arc<dyn PollListener>> + '_ {
    entries.iter().filter_map(Weak::upgrade)
}
