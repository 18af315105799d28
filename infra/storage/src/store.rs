use crate::error::StorageError;
use std::future::Future;

/// The durable key-value seam the gate persists through.
///
/// Every method takes the raw key string; implementations validate it as a
/// [`StoreKey`](crate::StoreKey) and fail with [`StorageError::InvalidKey`]
/// otherwise. Handles are cheap to clone and share one underlying store.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StorageError>> + Send;

    /// Durably stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Atomically replaces the value under `key` with `f(current)`.
    ///
    /// No other `set`, `remove` or `update` on the same store interleaves
    /// between the read and the write. If `f` fails, nothing is written.
    fn update<F, E>(&self, key: &str, f: F) -> impl Future<Output = Result<(), E>> + Send
    where
        F: FnOnce(Option<Vec<u8>>) -> Result<Vec<u8>, E> + Send,
        E: From<StorageError> + Send;

    /// Lists every stored key, sorted.
    fn keys(&self) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;
}
