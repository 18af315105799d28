//! Durable key-value persistence for the biometric gate.
//!
//! The gate only needs `get`/`set` on a handful of keys, plus one atomic
//! read-modify-write for the feature mapping. This crate provides that seam as
//! the [`KeyValueStore`] trait and two implementations:
//!
//! - **[`FileStore`]**: one file per key under a sandboxed root, sharded by the
//!   key prefix, written with an "atomic swap" (unique temp write + `fsync` +
//!   `rename`), optional transparent LZ4 compression, and self-healing cleanup
//!   of orphaned temporaries on open.
//! - **[`MemoryStore`]**: a process-local map for tests and ephemeral callers.
//!
//! # Example
//!
//! ```rust
//! use biogate_storage::{FileStore, KeyValueStore, StorageError, StoreOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("data");
//!     let store = FileStore::open(&root, StoreOptions::default()).await?;
//!
//!     store
//!         .update("biometric_auth.features", |current| {
//!             assert!(current.is_none());
//!             Ok::<_, StorageError>(br#"{"vault":true}"#.to_vec())
//!         })
//!         .await?;
//!
//!     assert!(store.get("biometric_auth.features").await?.is_some());
//!     Ok(())
//! }
//! ```

mod engine;
mod error;
mod key;
mod maintenance;
mod memory;
mod options;
mod security;
mod store;

pub use engine::{Compression, FileStore};
pub use error::{StorageError, StorageErrorExt};
pub use key::StoreKey;
pub use memory::MemoryStore;
pub use options::{DEFAULT_STALE_AFTER, StoreOptions};
pub use store::KeyValueStore;
