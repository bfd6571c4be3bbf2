//! Storage trait definitions

use anyhow::Result;

/// Ordered item store consumed by the polling engine
///
/// The store is owned by the caller; the engine holds a shared
/// reference and touches it only through this contract. Strategy
/// merges mutate it directly, the engine itself only needs occupancy,
/// the transactional replace capability, the metadata map, and a
/// synchronous persistence round-trip.
pub trait PollStore<T>: Send + Sync {
    /// Whether the store holds no items
    fn is_empty(&self) -> bool;

    /// Number of items in the store
    fn len(&self) -> usize;

    /// Open a transaction
    ///
    /// Buffered mutations become visible atomically at commit; no
    /// intermediate state is observable from outside the transaction.
    fn transaction(&self) -> Result<Box<dyn StoreTransaction<T> + '_>>;

    /// Read a metadata value
    fn get_meta(&self, key: &str) -> Option<String>;

    /// Write a metadata value
    fn set_meta(&self, key: &str, value: String);

    /// Synchronously reload persisted state
    fn load_sync(&self) -> Result<()>;

    /// Synchronously persist current state
    fn save_sync(&self) -> Result<()>;
}

/// Buffered mutations against a [`PollStore`]
pub trait StoreTransaction<T> {
    /// Remove all items
    fn clear(&mut self);

    /// Append items in order
    fn add_all(&mut self, items: Vec<T>);

    /// Apply the buffered mutations atomically
    fn commit(self: Box<Self>) -> Result<()>;
}
