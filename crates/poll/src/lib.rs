//! Poll crate - Refresh coordination for append-only feeds
//!
//! This crate provides a generic polling/pagination engine over a
//! caller-supplied item type:
//! - Single-flight refresh deduplication per direction (newer/older)
//! - Weakly-held listener fan-out with exactly-once terminal delivery
//! - Derived content state (unknown / ok / empty / error)
//! - Pagination exhaustion short-circuiting
//! - Best-effort full resync against a remote source, gated by a
//!   staleness threshold
//!
//! The concrete fetch/merge logic and the backing store are supplied
//! by the caller through the [`PollStrategy`] and [`PollStore`]
//! traits; this crate owns only the coordination.

pub mod error;
pub mod listener;
pub mod poll;
pub mod state;
pub mod storage;
pub mod strategy;

pub use error::PollError;
pub use listener::PollListener;
pub use poll::{Direction, Poll};
pub use state::PollState;
pub use storage::{FilePollStore, InMemoryPollStore, PollStore, StoreTransaction};
pub use strategy::{Pagination, PollStrategy};
