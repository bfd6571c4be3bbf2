//! JSON file-backed storage implementation
//!
//! Persists the item list together with its metadata map as a single
//! JSON snapshot, with an explicit synchronous load/save round-trip.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{PollStore, StoreTransaction};

#[derive(Serialize, Deserialize)]
struct Snapshot<T> {
    items: Vec<T>,
    meta: HashMap<String, String>,
}

/// File-backed implementation of [`PollStore`]
///
/// State lives in memory; `load_sync` and `save_sync` round-trip it
/// through a JSON file at the configured path. A missing file loads
/// as an empty store.
pub struct FilePollStore<T> {
    path: PathBuf,
    items: RwLock<Vec<T>>,
    meta: RwLock<HashMap<String, String>>,
}

impl<T> FilePollStore<T> {
    /// Create a store backed by the given file path
    ///
    /// Does not touch the filesystem; call
    /// [`load_sync`](PollStore::load_sync) to read existing state.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            items: RwLock::new(Vec::new()),
            meta: RwLock::new(HashMap::new()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot the current items
    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.read().unwrap().clone()
    }
}

impl<T> PollStore<T> for FilePollStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    fn transaction(&self) -> Result<Box<dyn StoreTransaction<T> + '_>> {
        Ok(Box::new(FileTransaction {
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
        if !self.path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read store file: {}", self.path.display()))?;
        let snapshot: Snapshot<T> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store file: {}", self.path.display()))?;

        *self.items.write().unwrap() = snapshot.items;
        *self.meta.write().unwrap() = snapshot.meta;
        Ok(())
    }

    fn save_sync(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
        }
        let snapshot = Snapshot {
            items: self.items.read().unwrap().clone(),
            meta: self.meta.read().unwrap().clone(),
        };
        let content = serde_json::to_string(&snapshot).context("Failed to serialize store")?;

        // Write atomically (write to temp, then rename) so an
        // interrupted save never leaves a truncated file behind.
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write store file: {}", temp_path.display()))?;
        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace store file: {}", self.path.display()))?;
        Ok(())
    }
}

struct FileTransaction<'a, T> {
    store: &'a FilePollStore<T>,
    clear: bool,
    added: Vec<T>,
}

impl<T> StoreTransaction<T> for FileTransaction<'_, T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
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
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.json");

        let store = FilePollStore::new(&path);
        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![10u32, 20, 30]);
        tx.commit().unwrap();
        store.set_meta("lastSyncTime", "42".to_string());
        store.save_sync().unwrap();

        let reloaded: FilePollStore<u32> = FilePollStore::new(&path);
        reloaded.load_sync().unwrap();
        assert_eq!(reloaded.items(), vec![10, 20, 30]);
        assert_eq!(reloaded.get_meta("lastSyncTime"), Some("42".to_string()));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store: FilePollStore<u32> = FilePollStore::new(dir.path().join("absent.json"));
        store.load_sync().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get_meta("lastSyncTime"), None);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("feed.json");

        let store: FilePollStore<u32> = FilePollStore::new(&path);
        store.save_sync().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_failed_save_leaves_previous_snapshot_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.json");

        let store = FilePollStore::new(&path);
        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![1u32, 2, 3]);
        tx.commit().unwrap();
        store.save_sync().unwrap();

        // Occupy the scratch path with a directory so the next save
        // fails before the rename.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        let mut tx = store.transaction().unwrap();
        tx.add_all(vec![4]);
        tx.commit().unwrap();
        assert!(store.save_sync().is_err());

        // The target file still holds the last complete snapshot
        let reloaded: FilePollStore<u32> = FilePollStore::new(&path);
        reloaded.load_sync().unwrap();
        assert_eq!(reloaded.items(), vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feed.json");
        std::fs::write(&path, "not json").unwrap();

        let store: FilePollStore<u32> = FilePollStore::new(&path);
        assert!(store.load_sync().is_err());
    }
}
