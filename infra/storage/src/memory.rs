use crate::error::StorageError;
use crate::key::StoreKey;
use crate::store::KeyValueStore;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// A process-local [`KeyValueStore`].
///
/// Nothing survives the process; clones share the same map. Intended for tests
/// and for callers that bring their own persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<FxHashMap<StoreKey, Vec<u8>>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = StoreKey::try_from(key)?;
        Ok(self.entries.read().get(&key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = StoreKey::try_from(key)?;
        self.entries.write().insert(key, value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let key = StoreKey::try_from(key)?;
        self.entries.write().remove(&key);
        Ok(())
    }

    async fn update<F, E>(&self, key: &str, f: F) -> Result<(), E>
    where
        F: FnOnce(Option<Vec<u8>>) -> Result<Vec<u8>, E> + Send,
        E: From<StorageError> + Send,
    {
        let key = StoreKey::try_from(key)?;
        let mut entries = self.entries.write();
        let next = f(entries.get(&key).cloned())?;
        entries.insert(key, next);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> =
            self.entries.read().keys().map(|k| k.as_str().to_owned()).collect();
        keys.sort_unstable();
        Ok(keys)
    }
}
