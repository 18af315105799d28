use crate::engine::TMP_MARKER;
use crate::key::StoreKey;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info};
use walkdir::{DirEntry, WalkDir};

pub(crate) async fn purge_tmp(root: &Path, stale_after: Duration) {
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || remove_stale(&root, now, stale_after)).await {
        Ok((removed, failed)) if removed > 0 || failed > 0 => {
            info!(removed, failed, "Cleaned up temporary files");
        },
        Err(e) => {
            error!(error = %e, "Temp file cleanup task panicked");
        },
        _ => {},
    }
}

/// Collects every committed record under `root`, skipping temporaries and
/// anything whose file name is not a valid key.
pub(crate) fn list_keys(root: &Path) -> Vec<String> {
    let mut keys: Vec<String> = WalkDir::new(root)
        .into_iter()
        .flatten()
        .filter(|entry| entry.file_type().is_file() && !is_tmp(entry))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
        .filter_map(|name| StoreKey::try_from(name).ok())
        .map(|key| key.as_str().to_owned())
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys
}

fn remove_stale(root: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .flatten()
        .filter(|e| e.path() != root)
        .for_each(|entry| {
            let path = entry.path();

            if entry.file_type().is_file() {
                if is_tmp(&entry) && is_stale(&entry, now, threshold) {
                    match std::fs::remove_file(path) {
                        Ok(()) => removed += 1,
                        Err(e) => {
                            tracing::warn!(p = %path.display(), err = %e, "IO fail");
                            failed += 1;
                        },
                    }
                }
            } else if entry.file_type().is_dir() {
                // Only succeeds for empty shard directories.
                let _ = std::fs::remove_dir(path);
            }
        });

    (removed, failed)
}

fn is_tmp(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER))
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    std::fs::metadata(entry.path())
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age > threshold)
}
