use super::{BiometricVerifier, VerifierError};

/// Verifier for platforms without biometric support.
///
/// Never capable, never enrolled; every challenge fails as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedVerifier;

impl BiometricVerifier for UnsupportedVerifier {
    async fn can_authenticate(&self) -> bool {
        false
    }

    async fn current_enrollment_fingerprint(&self) -> Option<Vec<u8>> {
        None
    }

    async fn evaluate(&self, _reason: &str) -> Result<bool, VerifierError> {
        Err(VerifierError::unavailable("Biometric authentication is not supported on this platform"))
    }
}
