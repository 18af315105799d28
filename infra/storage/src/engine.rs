//! File-backed key-value engine providing sandboxed, atomic, and compressed persistence.
//!
//! Each key is one file under the canonical root, sharded by its first four
//! characters. Mutations are serialized through a single async lock so that
//! [`KeyValueStore::update`] is a true read-modify-write.

use crate::error::{StorageError, StorageErrorExt};
use crate::key::StoreKey;
use crate::maintenance;
use crate::options::StoreOptions;
use crate::security;
use crate::store::KeyValueStore;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub(crate) const TMP_MARKER: &str = ".biogatetmp.";

/// Names tried before giving up when earlier temporaries are still on disk.
const TMP_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    #[must_use]
    fn compress(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::None => data.to_vec(),
            Self::Lz4 => lz4_flex::compress_prepend_size(data),
        }
    }

    fn decompress(self, data: Vec<u8>) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::None => Ok(data),
            Self::Lz4 => {
                lz4_flex::decompress_size_prepended(&data).context("Lz4 decompression failed")
            },
        }
    }
}

/// The internal shared state of a [`FileStore`].
#[derive(Debug)]
pub struct FileStoreInner {
    /// The canonicalized physical path on the disk where all records are stored.
    root: PathBuf,
    compression: Compression,
    stale_after: Duration,
    /// Per-handle sequence for temporary names; the process id keeps
    /// concurrent processes apart.
    tmp_counter: AtomicU64,
    /// Serializes every mutation (`set`, `remove`, `update`) on this handle.
    write_lock: Mutex<()>,
}

/// A thread-safe handle to the file-backed store.
///
/// - **Atomic Writes**: temporary file, `fsync`, rename over the target. A
///   failed write removes its temporary.
/// - **Transparent Compression**: optional LZ4 block compression.
/// - **Self-Healing**: stale temporary files are purged on open.
///
/// Clones share the same root and the same write lock. Separate handles (or
/// processes) on one root never collide on temporary names, but their
/// read-modify-write cycles are not serialized against each other.
///
/// # Example
///
/// ```rust
/// use biogate_storage::{Compression, FileStore, KeyValueStore, StorageError, StoreOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     # let root = tmp.path().join("data");
///     let options = StoreOptions { compression: Compression::Lz4, ..StoreOptions::default() };
///     let store = FileStore::open(&root, options).await?;
///
///     store.set("biometric_auth.domain_state", b"\x01\x02").await?;
///     assert_eq!(store.get("biometric_auth.domain_state").await?, Some(vec![1, 2]));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    inner: Arc<FileStoreInner>,
}

impl Deref for FileStore {
    type Target = FileStoreInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FileStore {
    /// Opens the store rooted at `root`.
    ///
    /// 1. **Bootstrapping**: creates the root when `options.create` is set.
    /// 2. **Canonicalization**: resolves the root to its physical path so
    ///    symlinked shards can be detected later.
    /// 3. **Self-Healing**: removes temporaries older than `options.stale_after`.
    ///    Failures here are logged and never abort the open.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the root does not exist and `create` is
    /// false, or if it cannot be created or resolved.
    pub async fn open(root: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StorageError> {
        let root = root.as_ref();

        if options.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap store root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve store root: {}", root.display()))?;

        let store = Self {
            inner: Arc::new(FileStoreInner {
                root: canonical,
                compression: options.compression,
                stale_after: options.stale_after,
                tmp_counter: AtomicU64::new(0),
                write_lock: Mutex::new(()),
            }),
        };

        store.purge_tmp().await;
        info!(root = %store.root.display(), compression = ?store.compression, "File store opened");

        Ok(store)
    }

    /// The canonical root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key to its physical path inside the sandbox.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for malformed keys and
    /// [`StorageError::PathTraversalAttempt`] if a shard directory escapes the root.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let key = StoreKey::try_from(key)?;
        security::resolve_key(&self.root, &key)
    }

    /// Removes temporary files left behind by interrupted writes.
    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.root, self.stale_after).await;
    }

    async fn read_resolved(&self, path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Read failed: {}", path.display()).into()),
                });
            },
        };

        self.compression.decompress(data).map(Some)
    }

    /// Writes `data` to `path` with the atomic swap pattern.
    ///
    /// 1. Data is written to a fresh temporary (`<key>.biogatetmp.<pid>.<n>`).
    /// 2. The file is synced to hardware (`fsync`).
    /// 3. The temporary file is renamed over the destination.
    ///
    /// Any failure after the temporary exists removes it again.
    async fn write_resolved(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create shards for {}", path.display()))?;
        }

        let payload = self.compression.compress(data);
        let (temp, file) = self.create_tmp(path).await?;

        if let Err(err) = commit(file, &temp, path, &payload).await {
            match fs::remove_file(&temp).await {
                Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                    warn!(path = %temp.display(), error = %cleanup, "Failed to remove temporary file");
                },
                _ => {},
            }
            return Err(err);
        }

        if let Some(parent) = path.parent() {
            sync_dir(parent).await;
        }

        debug!(path = %path.display(), bytes = data.len(), "Record saved atomically");
        Ok(())
    }

    /// Claims an unused temporary name next to `target`.
    ///
    /// Names left over from a crashed writer with a recycled process id are
    /// skipped rather than reused.
    async fn create_tmp(&self, target: &Path) -> Result<(PathBuf, fs::File), StorageError> {
        let mut attempt = 0;
        loop {
            let counter = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
            let temp = tmp_path(target, std::process::id(), counter);

            match fs::OpenOptions::new().create_new(true).write(true).open(&temp).await {
                Ok(file) => return Ok((temp, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists && attempt + 1 < TMP_ATTEMPTS => {
                    debug!(path = %temp.display(), "Temporary name taken");
                    attempt += 1;
                },
                Err(err) => {
                    return Err(StorageError::Io {
                        source: err,
                        context: Some(format!("Temp creation failed: {}", temp.display()).into()),
                    });
                },
            }
        }
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.resolve(key)?;
        self.read_resolved(&path).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        let _guard = self.write_lock.lock().await;
        self.write_resolved(&path, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Record removed");
                Ok(())
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to remove: {}", path.display()).into()),
            }),
        }
    }

    async fn update<F, E>(&self, key: &str, f: F) -> Result<(), E>
    where
        F: FnOnce(Option<Vec<u8>>) -> Result<Vec<u8>, E> + Send,
        E: From<StorageError> + Send,
    {
        let path = self.resolve(key)?;
        let _guard = self.write_lock.lock().await;
        let current = self.read_resolved(&path).await?;
        let next = f(current)?;
        self.write_resolved(&path, &next).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || maintenance::list_keys(&root))
            .await
            .map_err(|e| StorageError::Internal {
                message: e.to_string().into(),
                context: Some("Key listing task failed".into()),
            })
    }
}

/// Fills the temporary, syncs it and swaps it over `path`.
async fn commit(mut file: fs::File, temp: &Path, path: &Path, payload: &[u8]) -> Result<(), StorageError> {
    file.write_all(payload).await.context(format!("Write failed: {}", temp.display()))?;
    file.sync_all().await.context("Hardware sync failed")?;
    drop(file);

    match fs::rename(temp, path).await {
        Ok(()) => Ok(()),
        // Platforms without atomic replace refuse to rename over an existing file.
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            fs::remove_file(path)
                .await
                .context(format!("Failed to replace existing file: {}", path.display()))?;
            fs::rename(temp, path)
                .await
                .context(format!("Atomic swap failed: {} -> {}", temp.display(), path.display()))
        },
        Err(err) => Err(StorageError::Io {
            source: err,
            context: Some(format!("Atomic swap failed: {} -> {}", temp.display(), path.display()).into()),
        }),
    }
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn tmp_path(target: &Path, pid: u32, counter: u64) -> PathBuf {
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("record");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{pid}.{counter}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "biometric_auth.features";

    fn shard_entries(store: &FileStore) -> Vec<String> {
        let shard = store.resolve(KEY).unwrap().parent().unwrap().to_path_buf();
        let mut names: Vec<String> = std::fs::read_dir(shard)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort_unstable();
        names
    }

    #[tokio::test]
    async fn test_leftover_temporaries_do_not_block_writes() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path(), StoreOptions::default()).await.unwrap();
        store.set(KEY, b"{}").await.unwrap();

        // A previous run with the same process id died right after creating its temporaries.
        let target = store.resolve(KEY).unwrap();
        for counter in 0..3 {
            std::fs::write(tmp_path(&target, std::process::id(), counter), b"partial").unwrap();
        }

        let reopened = FileStore::open(temp.path(), StoreOptions::existing()).await.unwrap();
        reopened.set(KEY, br#"{"vault":true}"#).await.unwrap();
        assert_eq!(reopened.get(KEY).await.unwrap().as_deref(), Some(br#"{"vault":true}"#.as_slice()));
    }

    #[tokio::test]
    async fn test_separate_handles_write_concurrently() {
        let temp = TempDir::new().unwrap();
        let first = FileStore::open(temp.path(), StoreOptions::default()).await.unwrap();
        let second = FileStore::open(temp.path(), StoreOptions::default()).await.unwrap();

        let (a, b) = tokio::join!(first.set(KEY, b"first"), second.set(KEY, b"second"));
        a.unwrap();
        b.unwrap();

        let value = first.get(KEY).await.unwrap().unwrap();
        assert!(value == b"first" || value == b"second");
        assert_eq!(shard_entries(&first), vec![KEY.to_owned()]);
    }

    #[tokio::test]
    async fn test_failed_swap_removes_temporary() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path(), StoreOptions::default()).await.unwrap();

        // A non-empty directory where the record should go makes the rename fail.
        let target = store.resolve(KEY).unwrap();
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let err = store.set(KEY, b"{}").await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }), "{err:?}");
        assert_eq!(shard_entries(&store), vec![KEY.to_owned()]);
    }

    #[test]
    fn test_tmp_path_carries_process_and_counter() {
        let path = tmp_path(Path::new("/data/bi/om/biometric_auth.features"), 4242, 7);
        assert_eq!(path, Path::new("/data/bi/om/biometric_auth.features.biogatetmp.4242.7"));
    }
}
