//! The platform seam: everything the gate needs from the biometric service.
//!
//! Sensor access, matching and liveness all live behind [`BiometricVerifier`].
//! Implementations:
//! - [`CommandVerifier`]: bridges to an external helper executable.
//! - [`UnsupportedVerifier`]: platforms without biometric hardware.
//! - [`MockVerifier`](crate::mock::MockVerifier): scripted, for tests.

mod command;
mod unsupported;

pub use command::CommandVerifier;
pub use unsupported::UnsupportedVerifier;

use std::borrow::Cow;
use std::future::Future;

/// Platform-provided biometric capability.
pub trait BiometricVerifier: Send + Sync + 'static {
    /// Whether a biometric policy can be evaluated right now (hardware present,
    /// credentials enrolled, not locked out).
    fn can_authenticate(&self) -> impl Future<Output = bool> + Send;

    /// Opaque fingerprint of the enrolled credentials, `None` without capability.
    fn current_enrollment_fingerprint(&self) -> impl Future<Output = Option<Vec<u8>>> + Send;

    /// Runs one challenge, showing `reason` to the user.
    ///
    /// May suspend indefinitely while the user interacts with the prompt.
    /// `Ok(false)` is a clean rejection; `Err` is a platform-reported failure.
    fn evaluate(&self, reason: &str) -> impl Future<Output = Result<bool, VerifierError>> + Send;
}

/// A platform-reported evaluation failure, with its human-readable description.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("Challenge cancelled{}: {message}", format_context(.context))]
    Cancelled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Biometry locked out{}: {message}", format_context(.context))]
    Lockout { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("No biometric credentials enrolled{}: {message}", format_context(.context))]
    NotEnrolled { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Biometric service unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Evaluation failed{}: {message}", format_context(.context))]
    Failed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Verifier I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl VerifierError {
    pub fn cancelled(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Cancelled { message: message.into(), context: None }
    }

    pub fn lockout(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Lockout { message: message.into(), context: None }
    }

    pub fn failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Failed { message: message.into(), context: None }
    }

    pub fn unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unavailable { message: message.into(), context: None }
    }

    /// Whether the user actively dismissed the prompt; callers usually re-prompt
    /// only in this case.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
