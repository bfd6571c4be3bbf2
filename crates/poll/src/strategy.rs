//! Caller-supplied fetch/merge strategy

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use crate::error::PollError;

/// Pagination exhaustion flag shared between the engine and the
/// strategy's older-merge
///
/// The engine only reads the flag: once set, `fetch_more` requests
/// short-circuit with `on_exhausted` and no fetch is made. The
/// older-merge is responsible for setting it when a fetch yields
/// nothing new; clearing it again is a caller decision, not part of
/// the engine contract.
#[derive(Debug, Default)]
pub struct Pagination {
    exhausted: AtomicBool,
}

impl Pagination {
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }

    pub fn set_exhausted(&self, exhausted: bool) {
        self.exhausted.store(exhausted, Ordering::Release);
    }
}

/// Fetch and merge behavior supplied by the caller
///
/// The engine coordinates when fetches run and who hears about them;
/// the strategy decides what "newer", "older" and "all" items mean and
/// how fetched items are applied to the store. Merges run serialized
/// with every other store mutator, so implementations may mutate the
/// store without further locking.
pub trait PollStrategy<T>: Send + Sync {
    /// Fetch items newer than what the store holds
    fn fetch_newer(&self) -> Result<Vec<T>>;

    /// Fetch items older than what the store holds
    fn fetch_older(&self) -> Result<Vec<T>>;

    /// Fetch the complete remote collection, used only by
    /// [`crate::Poll::sync_with_remote`]
    ///
    /// Optional: the default fails fast with a distinct
    /// "not implemented" error, which makes the sync engine fail
    /// deterministically rather than silently misbehave.
    fn fetch_all(&self) -> Result<Vec<T>> {
        Err(PollError::NotImplemented { what: "fetch_all" }.into())
    }

    /// Apply newer items to the store, returning how many were newly
    /// added
    ///
    /// `clean_up` asks the merge to discard stale tail content while
    /// applying; it is only ever true for the newer direction.
    fn merge_newer(&self, items: Vec<T>, clean_up: bool) -> Result<usize>;

    /// Apply older items to the store, returning how many were newly
    /// added
    ///
    /// Responsible for calling `pagination.set_exhausted(true)` when
    /// `items` contains nothing new.
    fn merge_older(&self, items: Vec<T>, pagination: &Pagination) -> Result<usize>;

    /// User-facing text for a successful update; presentation only
    fn success_message(&self, added: usize) -> String {
        match added {
            0 => "No new items".to_string(),
            1 => "1 new item".to_string(),
            n => format!("{} new items", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_to_not_exhausted() {
        let pagination = Pagination::default();
        assert!(!pagination.is_exhausted());
    }

    #[test]
    fn test_pagination_set_and_reset() {
        let pagination = Pagination::default();
        pagination.set_exhausted(true);
        assert!(pagination.is_exhausted());
        pagination.set_exhausted(false);
        assert!(!pagination.is_exhausted());
    }
}
