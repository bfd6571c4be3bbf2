//! Storage traits and implementations
//!
//! The engine consumes the store through a small transactional
//! contract; the trait-based design allows swapping between in-memory
//! and persistent backends.

mod file;
mod memory;
mod traits;

pub use file::FilePollStore;
pub use memory::InMemoryPollStore;
pub use traits::{PollStore, StoreTransaction};
