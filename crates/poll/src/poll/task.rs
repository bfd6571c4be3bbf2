//! In-flight refresh task bookkeeping
//!
//! At most one task per direction slot is alive at any instant; the
//! slot decision ("create or attach") happens under the engine's slot
//! mutex, so tasks carry no locking of their own.

use std::fmt;

use crate::listener::ListenerRegistry;

/// Which way a fetch moves through the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Items newer than what the store holds
    Newer,
    /// Items older than what the store holds (pagination)
    Older,
    /// The complete remote collection (resync)
    FullResync,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Newer => write!(f, "newer"),
            Direction::Older => write!(f, "older"),
            Direction::FullResync => write!(f, "full-resync"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskStatus {
    Idle,
    Running,
    Completed,
}

/// One in-flight asynchronous fetch of one kind
///
/// Created lazily per slot, started at most once, and destroyed as
/// soon as its terminal notification has been dispatched. The
/// generation number lets a completion recognize that its slot has
/// already been handed to a successor.
pub(crate) struct RefreshTask {
    pub direction: Direction,
    pub generation: u64,
    pub clean_up: bool,
    pub status: TaskStatus,
    pub started_once: bool,
    pub listeners: ListenerRegistry,
}

impl RefreshTask {
    pub fn new(direction: Direction, generation: u64, clean_up: bool) -> Self {
        Self {
            direction,
            generation,
            clean_up,
            status: TaskStatus::Idle,
            started_once: false,
            listeners: ListenerRegistry::new(),
        }
    }
}

/// The two refresh channels, each holding at most one live task
pub(crate) struct Slots {
    pub updating: Option<RefreshTask>,
    pub fetching_more: Option<RefreshTask>,
}

impl Slots {
    pub fn new() -> Self {
        Self {
            updating: None,
            fetching_more: None,
        }
    }

    pub fn slot_mut(&mut self, direction: Direction) -> &mut Option<RefreshTask> {
        match direction {
            Direction::Older => &mut self.fetching_more,
            _ => &mut self.updating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_idle_and_unstarted() {
        let task = RefreshTask::new(Direction::Newer, 7, false);
        assert_eq!(task.status, TaskStatus::Idle);
        assert!(!task.started_once);
        assert_eq!(task.generation, 7);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut slots = Slots::new();
        *slots.slot_mut(Direction::Newer) = Some(RefreshTask::new(Direction::Newer, 0, false));
        assert!(slots.slot_mut(Direction::Older).is_none());
        assert!(slots.slot_mut(Direction::Newer).is_some());
    }
}
