use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::session::SessionStore;

/// Persistent key-value storage for session state.
pub trait StorageAdapter: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys. Every key is attempted; the first error is returned.
    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let mut first_error = None;
        for key in keys {
            if let Err(e) = self.remove(key) {
                log::warn!("Failed to remove {} from session storage: {}", key, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// File-backed adapter over `~/.orbit/session.json`
#[derive(Debug)]
pub struct FileStorageAdapter {
    store: SessionStore,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileStorageAdapter {
    /// Create an adapter for the default session file
    pub fn new() -> Result<Self> {
        Ok(Self::with_store(SessionStore::new()?))
    }

    pub fn with_store(store: SessionStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut std::collections::BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Session storage lock poisoned"))?;
        let mut entries = self.store.load()?;
        mutate(&mut entries);
        if entries.is_empty() {
            self.store.delete()
        } else {
            self.store.save(&entries)
        }
    }
}

impl StorageAdapter for FileStorageAdapter {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.store.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

/// In-memory adapter, used by tests and when no home directory is available
#[derive(Debug, Default)]
pub struct MemoryStorageAdapter {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory storage lock poisoned"))
    }
}

impl StorageAdapter for MemoryStorageAdapter {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_adapter(temp_dir: &TempDir) -> FileStorageAdapter {
        FileStorageAdapter::with_store(SessionStore::at(temp_dir.path().join("session.json")))
    }

    #[test]
    fn test_file_adapter_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let adapter = file_adapter(&temp_dir);

        adapter.set("authToken", "abc123").unwrap();
        adapter.set("username", "luna").unwrap();
        assert_eq!(adapter.get("authToken").unwrap(), Some("abc123".to_string()));
        assert_eq!(adapter.get("username").unwrap(), Some("luna".to_string()));

        adapter.remove("authToken").unwrap();
        assert_eq!(adapter.get("authToken").unwrap(), None);
        assert_eq!(adapter.get("username").unwrap(), Some("luna".to_string()));
    }

    #[test]
    fn test_file_adapter_removes_file_when_empty() {
        let temp_dir = TempDir::new().unwrap();
        let adapter = file_adapter(&temp_dir);

        adapter.set("authToken", "abc123").unwrap();
        assert!(temp_dir.path().join("session.json").exists());

        adapter.remove("authToken").unwrap();
        assert!(!temp_dir.path().join("session.json").exists());
    }

    #[test]
    fn test_file_adapter_remove_all_in_one_write() {
        let temp_dir = TempDir::new().unwrap();
        let adapter = file_adapter(&temp_dir);

        adapter.set("authToken", "abc123").unwrap();
        adapter.set("userRole", "creator").unwrap();
        adapter.set("theme", "light").unwrap();

        adapter.remove_all(&["authToken", "userRole"]).unwrap();
        assert_eq!(adapter.get("authToken").unwrap(), None);
        assert_eq!(adapter.get("userRole").unwrap(), None);
        assert_eq!(adapter.get("theme").unwrap(), Some("light".to_string()));
    }

    #[test]
    fn test_memory_adapter() {
        let adapter = MemoryStorageAdapter::new();
        assert_eq!(adapter.get("missing").unwrap(), None);
        adapter.set("k", "v").unwrap();
        assert_eq!(adapter.get("k").unwrap(), Some("v".to_string()));
        adapter.remove("k").unwrap();
        assert_eq!(adapter.get("k").unwrap(), None);
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_file_adapter_returns_last_written_value(
            values in prop::collection::vec("[a-zA-Z0-9_-]{1,64}", 1..5)
        ) {
            let temp_dir = TempDir::new().unwrap();
            let adapter = file_adapter(&temp_dir);

            for value in &values {
                adapter.set("authToken", value).unwrap();
            }

            prop_assert_eq!(adapter.get("authToken").unwrap(), values.last().cloned());
        }
    }
}
