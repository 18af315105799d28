//! Mock implementations for testing.
//!
//! Provides deterministic, scriptable behavior for automated tests and demos.

use crate::verifier::{BiometricVerifier, VerifierError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug)]
struct MockState {
    available: bool,
    fingerprint: Option<Vec<u8>>,
    responses: VecDeque<Result<bool, VerifierError>>,
    default_response: bool,
    challenges: Vec<String>,
}

/// Scripted verifier.
///
/// Clones share state, so a test can keep one handle while the gate owns another.
/// Challenges answer from the queued responses first, then fall back to the
/// default response (`true` unless changed).
///
/// # Example
///
/// ```
/// use biogate_auth::mock::MockVerifier;
/// use biogate_auth::verifier::VerifierError;
///
/// let verifier = MockVerifier::new().with_fingerprint([1, 2, 3]);
/// verifier.push_response(Err(VerifierError::cancelled("user tapped cancel")));
/// assert_eq!(verifier.challenge_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockVerifier {
    state: Arc<Mutex<MockState>>,
}

impl MockVerifier {
    /// A capable device with no enrolled fingerprint that grants every challenge.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                available: true,
                fingerprint: None,
                responses: VecDeque::new(),
                default_response: true,
                challenges: Vec::new(),
            })),
        }
    }

    /// A device without biometric capability.
    #[must_use]
    pub fn unavailable() -> Self {
        let verifier = Self::new();
        verifier.set_available(false);
        verifier
    }

    #[must_use]
    pub fn with_fingerprint(self, fingerprint: impl Into<Vec<u8>>) -> Self {
        self.set_fingerprint(Some(fingerprint.into()));
        self
    }

    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Simulates enrolling or removing a credential.
    pub fn set_fingerprint(&self, fingerprint: Option<Vec<u8>>) {
        self.state.lock().fingerprint = fingerprint;
    }

    /// Queues the outcome of the next challenge.
    pub fn push_response(&self, response: Result<bool, VerifierError>) {
        self.state.lock().responses.push_back(response);
    }

    pub fn set_default_response(&self, granted: bool) {
        self.state.lock().default_response = granted;
    }

    /// Reasons of every challenge performed so far, oldest first.
    #[must_use]
    pub fn challenges(&self) -> Vec<String> {
        self.state.lock().challenges.clone()
    }

    #[must_use]
    pub fn challenge_count(&self) -> usize {
        self.state.lock().challenges.len()
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BiometricVerifier for MockVerifier {
    async fn can_authenticate(&self) -> bool {
        self.state.lock().available
    }

    async fn current_enrollment_fingerprint(&self) -> Option<Vec<u8>> {
        let state = self.state.lock();
        if state.available { state.fingerprint.clone() } else { None }
    }

    async fn evaluate(&self, reason: &str) -> Result<bool, VerifierError> {
        let mut state = self.state.lock();
        state.challenges.push(reason.to_owned());
        let default = state.default_response;
        state.responses.pop_front().unwrap_or(Ok(default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_responses_then_default() {
        let verifier = MockVerifier::new();
        verifier.push_response(Ok(false));
        verifier.push_response(Err(VerifierError::lockout("too many attempts")));

        assert!(!verifier.evaluate("first").await.unwrap());
        assert!(verifier.evaluate("second").await.is_err());
        assert!(verifier.evaluate("third").await.unwrap());
        assert_eq!(verifier.challenges(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let verifier = MockVerifier::new().with_fingerprint([9]);
        let handle = verifier.clone();

        handle.set_available(false);
        assert!(!verifier.can_authenticate().await);
        assert_eq!(verifier.current_enrollment_fingerprint().await, None);

        handle.set_available(true);
        assert_eq!(verifier.current_enrollment_fingerprint().await, Some(vec![9]));
    }
}
