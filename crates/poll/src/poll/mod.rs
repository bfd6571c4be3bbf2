//! Poll engine
//!
//! Coordinates asynchronous retrieval of a growing, append-only
//! collection: deduplicates concurrent refresh requests into a single
//! in-flight task per direction, fans completion out to every
//! subscriber, tracks the derived content state and the pagination
//! exhaustion flag, and runs a best-effort full resync against the
//! remote source.

mod sync;
mod task;
mod timing;

pub use task::Direction;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};

use crate::error::PollError;
use crate::listener::{PollListener, live};
use crate::state::{PollState, StateCell};
use crate::storage::PollStore;
use crate::strategy::{Pagination, PollStrategy};
use task::{RefreshTask, Slots, TaskStatus};
use timing::Timing;

/// Polling engine over a caller-supplied strategy and store
///
/// `Poll` is cheap to clone; clones share the same underlying state
/// and may be handed to other threads. Requests return immediately,
/// outcomes arrive through [`PollListener`] callbacks on a background
/// thread.
pub struct Poll<T> {
    inner: Arc<PollInner<T>>,
}

impl<T> Clone for Poll<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct PollInner<T> {
    pub(crate) strategy: Arc<dyn PollStrategy<T>>,
    pub(crate) store: Arc<dyn PollStore<T>>,
    /// Slot decisions (create-or-attach) are one critical section
    slots: Mutex<Slots>,
    generations: AtomicU64,
    pub(crate) timing: Timing,
    state: StateCell,
    pagination: Pagination,
    /// Serializes every store-mutating region: merge application at
    /// completion and the sync engine's replace-all
    pub(crate) write_lock: Mutex<()>,
    pub(crate) sync_ongoing: AtomicBool,
}

impl<T: Send + Sync + 'static> Poll<T> {
    /// Create an engine over the given strategy and store
    ///
    /// `refresh_period` is the minimum interval between newer-fetches
    /// enforced by [`should_update`](Poll::should_update) and the
    /// staleness threshold for [`sync_with_remote`](Poll::sync_with_remote).
    pub fn new(
        strategy: Arc<dyn PollStrategy<T>>,
        store: Arc<dyn PollStore<T>>,
        refresh_period: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PollInner {
                strategy,
                store,
                slots: Mutex::new(Slots::new()),
                generations: AtomicU64::new(0),
                timing: Timing::new(refresh_period),
                state: StateCell::new(),
                pagination: Pagination::default(),
                write_lock: Mutex::new(()),
                sync_ongoing: AtomicBool::new(false),
            }),
        }
    }

    /// Whether more than one refresh period has passed since the last
    /// successful update
    pub fn should_update(&self) -> bool {
        self.inner.timing.should_update(timing::now_ms())
    }

    /// Update only if [`should_update`](Poll::should_update) says so
    pub fn update_if_necessary(&self, listener: Option<&Arc<dyn PollListener>>) {
        if self.should_update() {
            self.update(listener, false);
        }
    }

    /// Fetch newer items
    ///
    /// If a newer-fetch is already in flight the listener joins it
    /// (receiving `on_already_polling` plus the eventual terminal
    /// callback) instead of triggering a second fetch. Prefer
    /// [`update_if_necessary`](Poll::update_if_necessary) unless the
    /// refresh-period gate must be bypassed.
    pub fn update(&self, listener: Option<&Arc<dyn PollListener>>, clean_up: bool) {
        self.request(Direction::Newer, listener, clean_up);
    }

    /// Fetch older items (pagination)
    ///
    /// Once the strategy has marked pagination exhausted, this
    /// delivers `on_exhausted` synchronously and makes no fetch.
    pub fn fetch_more(&self, listener: Option<&Arc<dyn PollListener>>) {
        if self.inner.pagination.is_exhausted() {
            debug!("Older fetch short-circuited: pagination exhausted");
            if let Some(listener) = listener {
                listener.on_exhausted();
            }
            return;
        }
        self.request(Direction::Older, listener, false);
    }

    /// Current content state
    ///
    /// A non-empty store always reads as [`PollState::Ok`] regardless
    /// of the last recorded value.
    pub fn get_state(&self) -> PollState {
        self.inner.state.read(self.inner.store.is_empty())
    }

    /// Whether a fetch is in flight in either direction
    pub fn is_polling(&self) -> bool {
        let slots = self.inner.slots.lock().unwrap();
        let running = |task: &Option<RefreshTask>| {
            task.as_ref()
                .is_some_and(|t| t.status == TaskStatus::Running)
        };
        running(&slots.updating) || running(&slots.fetching_more)
    }

    /// Pagination exhaustion flag
    ///
    /// The engine only reads the flag; the strategy's older-merge sets
    /// it and the caller may reset it to re-enable `fetch_more`.
    pub fn pagination(&self) -> &Pagination {
        &self.inner.pagination
    }

    /// Forget the last update time so the next staleness check passes
    pub fn reset_last_time_updated(&self) {
        self.inner.timing.reset();
    }

    /// Suppress refreshes for a caller-chosen window
    ///
    /// Only ever moves the last-update time forward; a call implying
    /// an older timestamp than the current one is a no-op.
    pub fn dont_update_for_next(&self, duration: Duration) {
        self.inner.timing.suppress(timing::now_ms(), duration);
    }

    /// Single-flight create-or-attach on the direction's slot
    fn request(&self, direction: Direction, listener: Option<&Arc<dyn PollListener>>, clean_up: bool) {
        let mut joined_running = false;
        let mut started = None;
        {
            let mut slots = self.inner.slots.lock().unwrap();
            let slot = slots.slot_mut(direction);
            if slot.as_ref().is_none_or(|t| t.status != TaskStatus::Running) {
                let next = self.inner.generations.fetch_add(1, Ordering::Relaxed);
                *slot = Some(RefreshTask::new(direction, next, clean_up));
            }
            if let Some(task) = slot.as_mut() {
                if let Some(listener) = listener {
                    task.listeners.add(listener);
                    if task.status == TaskStatus::Running {
                        joined_running = true;
                    }
                }
                if !task.started_once {
                    task.started_once = true;
                    task.status = TaskStatus::Running;
                    // The spawn runs with the task's own parameters: a
                    // joiner's clean_up flag never alters a fetch that
                    // is already in flight.
                    started = Some((task.direction, task.generation, task.clean_up));
                }
            }
        }

        // Callbacks fire outside the slot lock; listeners may re-enter
        // the engine.
        if let Some(listener) = listener {
            if joined_running {
                listener.on_already_polling();
            }
            // Only the very first caller for a task instance sees
            // on_start; later joiners get on_already_polling above.
            if started.is_some() {
                listener.on_start();
            }
        }
        if let Some((direction, generation, clean_up)) = started {
            debug!("Starting {} fetch (generation {})", direction, generation);
            let inner = Arc::clone(&self.inner);
            thread::spawn(move || inner.run_fetch(direction, generation, clean_up));
        }
    }
}

impl<T: Send + Sync + 'static> PollInner<T> {
    fn run_fetch(&self, direction: Direction, generation: u64, clean_up: bool) {
        let fetched = match direction {
            Direction::Newer => self.strategy.fetch_newer(),
            Direction::Older => self.strategy.fetch_older(),
            Direction::FullResync => self.strategy.fetch_all(),
        };
        self.complete(direction, generation, clean_up, fetched);
    }

    /// Apply the fetch outcome and dispatch terminal notifications
    /// exactly once
    fn complete(&self, direction: Direction, generation: u64, clean_up: bool, fetched: Result<Vec<T>>) {
        // Merge application and state derivation are serialized with
        // every other store mutator.
        let write_guard = self.write_lock.lock().unwrap();

        let outcome = match fetched {
            Ok(items) => {
                debug!("Fetched {} {} items, merging", items.len(), direction);
                let merged = match direction {
                    Direction::Older => self.strategy.merge_older(items, &self.pagination),
                    _ => self.strategy.merge_newer(items, clean_up),
                };
                merged.map_err(|source| PollError::Merge { source })
            }
            Err(source) => Err(PollError::Fetch { source }),
        };

        let store_empty = self.store.is_empty();
        let (changed, new_state) = match &outcome {
            Ok(added) => {
                if direction == Direction::Newer {
                    self.timing.mark_updated(timing::now_ms());
                }
                info!("{} refresh succeeded: {} new items", direction, added);
                let next = if store_empty {
                    PollState::NoContent
                } else {
                    PollState::Ok
                };
                (self.state.record(next), next)
            }
            Err(error) => {
                warn!("{} refresh failed: {}", direction, error);
                // A failed refresh of a non-empty store does not
                // downgrade the state.
                if store_empty {
                    (self.state.record(PollState::Error), PollState::Error)
                } else {
                    (false, PollState::Error)
                }
            }
        };

        // Clear the slot and drain the registry before dispatching, so
        // a re-entrant request from a callback starts a fresh task.
        let drained = {
            let mut slots = self.slots.lock().unwrap();
            let slot = slots.slot_mut(direction);
            match slot.take() {
                Some(mut task) if task.generation == generation => {
                    task.status = TaskStatus::Completed;
                    task.listeners.take()
                }
                Some(task) => {
                    // The slot was already handed to a successor;
                    // leave it alone.
                    *slot = Some(task);
                    Vec::new()
                }
                None => Vec::new(),
            }
        };
        drop(write_guard);

        match &outcome {
            Ok(added) => {
                for listener in live(&drained) {
                    listener.on_success(*added);
                }
            }
            Err(error) => {
                for listener in live(&drained) {
                    listener.on_error(error);
                }
            }
        }
        if changed {
            for listener in live(&drained) {
                listener.on_state_changed(new_state);
            }
        }
    }
}
