use crate::engine::Compression;
use std::time::Duration;

/// Temporaries older than this belong to a writer that died mid-write.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(300);

/// Settings for [`FileStore::open`](crate::FileStore::open).
///
/// ```rust
/// use biogate_storage::{Compression, StoreOptions};
///
/// let options = StoreOptions { compression: Compression::Lz4, ..StoreOptions::default() };
/// assert!(options.create);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Compression applied to every record written by this handle.
    pub compression: Compression,
    /// Create the root directory and its parents when missing.
    pub create: bool,
    /// Age after which leftover temporaries are purged on open.
    pub stale_after: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { compression: Compression::None, create: true, stale_after: DEFAULT_STALE_AFTER }
    }
}

impl StoreOptions {
    /// Opens an existing root only; a missing directory is an error.
    #[must_use]
    pub fn existing() -> Self {
        Self { create: false, ..Self::default() }
    }
}
