use crate::error::StorageError;
use crate::key::StoreKey;
use std::path::{Path, PathBuf};

/// Joins the sharded location of `key` onto `root` and ensures it stays inside the sandbox.
///
/// Keys cannot carry separators or `..`, so the lexical join is always below
/// `root`. What remains is the symlink case: an existing shard directory that
/// points elsewhere.
pub(crate) fn resolve_key(root: &Path, key: &StoreKey) -> Result<PathBuf, StorageError> {
    let joined = root.join(key.sharded_path());
    validate_path(root, &joined)?;
    Ok(joined)
}

/// Validates a path by finding and verifying its first existing ancestor.
///
/// Walks up from the target until it finds something that exists on disk, then
/// checks that its canonical form is still within the sandbox.
fn validate_path(root: &Path, joined: &Path) -> Result<(), StorageError> {
    if !joined.starts_with(root) {
        return Err(StorageError::PathTraversalAttempt {
            message: joined.display().to_string().into(),
            context: Some("Path is outside sandbox boundaries".into()),
        });
    }

    let mut current = Some(joined);

    while let Some(path) = current {
        if path == root {
            return Ok(());
        }

        if path.exists() {
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(root) => Ok(()),
                Ok(canonical) => Err(StorageError::PathTraversalAttempt {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing shard directory is a symlink outside sandbox".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some("Failed to verify shard directory".into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::PathTraversalAttempt {
        message: joined.display().to_string().into(),
        context: Some("No valid parent directory found within sandbox".into()),
    })
}
