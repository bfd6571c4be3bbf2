//! Best-effort full resynchronization against the remote source
//!
//! Mutually exclusive with itself only; coordination with refresh
//! completions happens through the engine's shared writer lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::Error;
use log::{debug, info, warn};

use super::timing::now_ms;
use super::{Poll, PollInner};
use crate::error::PollError;

/// Metadata key holding the epoch-millisecond time of the last
/// completed resync
pub(crate) const META_LAST_SYNC_TIME: &str = "lastSyncTime";

/// Clears the admission flag on every exit path, including panics
struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Send + Sync + 'static> Poll<T> {
    /// Reconcile the store against the remote source of truth
    ///
    /// Returns immediately. If a sync is already ongoing the call is a
    /// no-op (no queuing). Otherwise a background thread reloads the
    /// persisted store, checks the `lastSyncTime` metadata against the
    /// refresh period, and when stale replaces the store's contents
    /// atomically with the strategy's `fetch_all` result.
    ///
    /// Failures on this path are swallowed: no listener notification,
    /// no retry, no state transition. Only a warning is logged. This
    /// mirrors the behavior callers depend on; see DESIGN.md for why
    /// it is flagged rather than extended elsewhere.
    pub fn sync_with_remote(&self) {
        if self
            .inner
            .sync_ongoing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Sync already ongoing, skipping");
            return;
        }

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let _guard = SyncGuard(&inner.sync_ongoing);
            if let Err(source) = inner.run_sync() {
                let error = PollError::Sync { source };
                warn!("Sync with remote failed: {:#}", Error::new(error));
            }
        });
    }

    /// Whether a background sync is currently running
    pub fn is_syncing(&self) -> bool {
        self.inner.sync_ongoing.load(Ordering::Acquire)
    }
}

impl<T: Send + Sync + 'static> PollInner<T> {
    fn run_sync(&self) -> Result<(), Error> {
        let now = now_ms();

        // Reload persisted state and adopt the recorded sync time.
        let last_sync_time = {
            let _write = self.write_lock.lock().unwrap();
            self.store.load_sync()?;
            self.store
                .get_meta(META_LAST_SYNC_TIME)
                .and_then(|value| value.parse::<i64>().ok())
                .unwrap_or(0)
        };
        self.timing.adopt(last_sync_time);

        if now - self.timing.refresh_period_ms() < last_sync_time {
            debug!("Resync not due yet (last sync {} ms ago)", now - last_sync_time);
            return Ok(());
        }

        // The fetch runs without the writer lock; only the replace-all
        // is serialized with other mutators.
        let items = self.strategy.fetch_all()?;
        let count = items.len();

        {
            let _write = self.write_lock.lock().unwrap();
            let mut tx = self.store.transaction()?;
            tx.clear();
            tx.add_all(items);
            tx.commit()?;

            let completed_at = now_ms();
            self.store.set_meta(META_LAST_SYNC_TIME, completed_at.to_string());
            self.store.save_sync()?;
            self.timing.mark_updated(completed_at);
        }

        info!("Full resync complete: store replaced with {} items", count);
        Ok(())
    }
}
