use crate::error::StorageError;
use std::fmt;
use std::path::PathBuf;

const MAX_KEY_LEN: usize = 128;

/// A validated store key.
///
/// Keys map one-to-one onto file names, so they are restricted to a portable,
/// separator-free alphabet.
///
/// # Constraints
/// - ASCII alphanumerics, `_`, `-` and `.` only.
/// - Automatically converted to **lowercase**.
/// - Must not be empty, start with `.`, contain `..` or exceed 128 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey(String);

impl StoreKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Relative on-disk location: two shard levels taken from the first four
    /// characters, then the key itself as the file name.
    pub(crate) fn sharded_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() >= 4 {
            path.push(chars[0..2].iter().collect::<String>());
            path.push(chars[2..4].iter().collect::<String>());
        }
        path.push(&self.0);
        path
    }
}

impl TryFrom<&str> for StoreKey {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        let key = value.to_lowercase();

        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                message: "EMPTY".into(),
                context: Some("Store key cannot be empty".into()),
            });
        }

        if key.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey {
                message: format!("{} characters", key.len()).into(),
                context: Some("Store key is too long".into()),
            });
        }

        if key.starts_with('.') {
            return Err(StorageError::InvalidKey {
                message: key.into(),
                context: Some("Store key cannot start with '.'".into()),
            });
        }

        if key.contains("..") {
            return Err(StorageError::InvalidKey {
                message: key.into(),
                context: Some("Store key cannot contain '..'".into()),
            });
        }

        if !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
            return Err(StorageError::InvalidKey {
                message: key.into(),
                context: Some("Store key contains illegal characters".into()),
            });
        }

        Ok(Self(key))
    }
}

impl TryFrom<String> for StoreKey {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for StoreKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
