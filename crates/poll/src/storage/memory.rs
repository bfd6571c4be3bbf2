//! In-memory storage implementation
//!
//! Used for testing and for feeds that don't need to survive a
//! process restart.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;

use super::{PollStore, StoreTransaction};

/// In-memory implementation of [`PollStore`]
///
/// Items and metadata live behind `RwLock`s for thread-safe access.
/// The persistence round-trip (`load_sync`/`save_sync`) is a no-op.
pub struct InMemoryPollStore<T> {
    items: RwLock<Vec<T>>,
    meta: RwLock<HashMap<String, String>>,
}

impl<T> InMemoryPollStore<T> {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            meta: RwLock::new(HashMap::new()),
        }
    }

    /// Snapshot the current items
    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.read().unwrap().clone()
    }
}

impl<T> Default for InMemoryPollStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> PollStore<T> for InMemoryPollStore<T> {
    fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    fn transaction(&self) -> Result<Box<dyn StoreTransaction<T> + '_>> {
        Ok(Box::new(MemoryTransaction {
            store: self,
            clear: false,
            added: Vec::new(),
        }))
    }

    fn get_meta(&self, key: &str) -> Option<String> {
        self.meta.read().unwrap().get(key).cloned()
    }

    fn set_meta(&self, key: &str, value: String) {
        self.meta.write().unwrap().insert(key.to_string(), value);
    }

    fn load_sync(&self) -> Result<()> {
        Ok(())
    }

    fn save_sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Transaction buffering mutations until commit
struct MemoryTransaction<'a, T> {
    store: &'a InMemoryPollStore<T>,
    clear: bool,
    added: Vec<T>,
}

impl<T: Send + Sync> StoreTransaction<T> for MemoryTransaction<'_, T> {
    fn clear(&mut self) {
        self.clear = true;
        self.added.clear();
    }

    fn add_all(&mut self, items: Vec<T>) {
        self.added.extend(items);
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let mut items = self.store.items.write().unwrap();
        if self.clear {
            items.clear();
        }
        items.extend(self.added);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_applies_buffered_items() {
        let store = InMemoryPollStore::new();
        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![1, 2, 3]);
        tx.commit().unwrap();

        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_uncommitted_transaction_is_invisible() {
        let store = InMemoryPollStore::new();
        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![1, 2, 3]);
        drop(tx);

        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_then_add_replaces_contents() {
        let store = InMemoryPollStore::new();
        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![1, 2, 3]);
        tx.commit().unwrap();

        let mut tx = store.transaction().unwrap();
        tx.clear();
        tx.add_all(vec![7, 8]);
        tx.commit().unwrap();

        assert_eq!(store.items(), vec![7, 8]);
    }

    #[test]
    fn test_add_without_clear_appends() {
        let store = InMemoryPollStore::new();
        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![1]);
        tx.commit().unwrap();

        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![2]);
        tx.commit().unwrap();

        assert_eq!(store.items(), vec![1, 2]);
    }

    #[test]
    fn test_metadata_round_trip() {
        let store: InMemoryPollStore<u32> = InMemoryPollStore::new();
        assert_eq!(store.get_meta("lastSyncTime"), None);
        store.set_meta("lastSyncTime", "12345".to_string());
        assert_eq!(store.get_meta("lastSyncTime"), Some("12345".to_string()));
    }
}
