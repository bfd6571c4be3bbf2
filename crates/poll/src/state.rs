//! Derived content state for a poll

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Coarse content state derived from store occupancy and the outcome
/// of the most recent completed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollState {
    /// No poll has completed yet
    Unknown,
    /// Content is present
    Ok,
    /// The last poll completed but the store is empty
    NoContent,
    /// The last poll failed while the store was empty
    Error,
}

/// Recorded-state cell with the occupancy override rule
///
/// The recorded value only changes at task completion, but reading the
/// state while the store holds items always yields `Ok` (and records
/// it, so a later transition away from `Ok` is detectable).
pub(crate) struct StateCell {
    recorded: Mutex<PollState>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            recorded: Mutex::new(PollState::Unknown),
        }
    }

    /// Read the state, overriding to `Ok` when the store is non-empty
    pub fn read(&self, store_empty: bool) -> PollState {
        let mut recorded = self.recorded.lock().unwrap();
        if !store_empty {
            *recorded = PollState::Ok;
        }
        *recorded
    }

    /// Record a new state value, returning whether it changed
    pub fn record(&self, next: PollState) -> bool {
        let mut recorded = self.recorded.lock().unwrap();
        let changed = *recorded != next;
        *recorded = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_unknown() {
        let cell = StateCell::new();
        assert_eq!(cell.read(true), PollState::Unknown);
    }

    #[test]
    fn test_non_empty_store_overrides_to_ok() {
        let cell = StateCell::new();
        cell.record(PollState::Error);
        assert_eq!(cell.read(false), PollState::Ok);
        // The override is recorded, not just returned
        assert_eq!(cell.read(true), PollState::Ok);
    }

    #[test]
    fn test_record_reports_change() {
        let cell = StateCell::new();
        assert!(cell.record(PollState::NoContent));
        assert!(!cell.record(PollState::NoContent));
        assert!(cell.record(PollState::Ok));
    }

    #[test]
    fn test_empty_store_yields_recorded_value() {
        let cell = StateCell::new();
        cell.record(PollState::NoContent);
        assert_eq!(cell.read(true), PollState::NoContent);
    }
}
