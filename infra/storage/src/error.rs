use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid store key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Decompression failure{}: {source}", format_context(.context))]
    Decompress { source: lz4_flex::block::DecompressError, context: Option<Cow<'static, str>> },

    #[error("Internal storage error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Adds `.context(..)` to results that can be converted into a [`StorageError`].
pub trait StorageErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError>;
}

impl<T> StorageErrorExt<T> for Result<T, StorageError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError> {
        self.map_err(|mut err| {
            match &mut err {
                StorageError::InvalidKey { context: c, .. }
                | StorageError::PathTraversalAttempt { context: c, .. }
                | StorageError::Io { context: c, .. }
                | StorageError::Decompress { context: c, .. }
                | StorageError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            err
        })
    }
}

impl<T> StorageErrorExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError> {
        self.map_err(|source| StorageError::Io { source, context: Some(context.into()) })
    }
}

impl<T> StorageErrorExt<T> for Result<T, lz4_flex::block::DecompressError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, StorageError> {
        self.map_err(|source| StorageError::Decompress { source, context: Some(context.into()) })
    }
}

impl From<std::io::Error> for StorageError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, context: None }
    }
}

impl From<lz4_flex::block::DecompressError> for StorageError {
    fn from(source: lz4_flex::block::DecompressError) -> Self {
        Self::Decompress { source, context: None }
    }
}

impl From<&'static str> for StorageError {
    fn from(s: &'static str) -> Self {
        Self::Internal { message: Cow::Borrowed(s), context: None }
    }
}

impl From<String> for StorageError {
    fn from(s: String) -> Self {
        Self::Internal { message: Cow::Owned(s), context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
