use crate::verifier::VerifierError;
use biogate_domain::features::InvalidFeatureName;
use biogate_storage::StorageError;
use std::borrow::Cow;

/// Errors surfaced by the gate to its immediate caller.
///
/// Nothing here is retried or swallowed by the gate itself.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Enrolled credentials changed since the last accepted baseline and the
    /// gate runs in strict mode. Calling `is_available` again re-baselines.
    #[error("Biometric enrollment changed{}: {message}", format_context(.context))]
    DomainStateChanged { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The platform cannot evaluate a biometric policy at all.
    #[error("Biometric authentication not available{}: {message}", format_context(.context))]
    AuthenticationNotAvailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The platform reported a failed evaluation (cancellation, lockout, ...).
    #[error("Biometric evaluation failed{}: {source}", format_context(.context))]
    Verifier { source: VerifierError, context: Option<Cow<'static, str>> },

    #[error("Invalid feature{}: {source}", format_context(.context))]
    InvalidFeature { source: InvalidFeatureName, context: Option<Cow<'static, str>> },

    #[error("Persistence failure{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Corrupted feature mapping{}: {source}", format_context(.context))]
    Codec { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

/// Adds `.context(..)` to results that can be converted into a [`GateError`].
pub trait GateErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, GateError>;
}

impl<T> GateErrorExt<T> for Result<T, GateError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, GateError> {
        self.map_err(|mut err| {
            match &mut err {
                GateError::DomainStateChanged { context: c, .. }
                | GateError::AuthenticationNotAvailable { context: c, .. }
                | GateError::Verifier { context: c, .. }
                | GateError::InvalidFeature { context: c, .. }
                | GateError::Storage { context: c, .. }
                | GateError::Codec { context: c, .. } => *c = Some(context.into()),
            }
            err
        })
    }
}

impl<T> GateErrorExt<T> for Result<T, VerifierError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, GateError> {
        self.map_err(|source| GateError::Verifier { source, context: Some(context.into()) })
    }
}

impl<T> GateErrorExt<T> for Result<T, StorageError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, GateError> {
        self.map_err(|source| GateError::Storage { source, context: Some(context.into()) })
    }
}

impl<T> GateErrorExt<T> for Result<T, serde_json::Error> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, GateError> {
        self.map_err(|source| GateError::Codec { source, context: Some(context.into()) })
    }
}

impl From<VerifierError> for GateError {
    fn from(source: VerifierError) -> Self {
        Self::Verifier { source, context: None }
    }
}

impl From<InvalidFeatureName> for GateError {
    fn from(source: InvalidFeatureName) -> Self {
        Self::InvalidFeature { source, context: None }
    }
}

impl From<StorageError> for GateError {
    fn from(source: StorageError) -> Self {
        Self::Storage { source, context: None }
    }
}

impl From<serde_json::Error> for GateError {
    fn from(source: serde_json::Error) -> Self {
        Self::Codec { source, context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
