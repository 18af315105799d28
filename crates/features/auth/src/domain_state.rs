//! Detection of biometric enrollment changes.
//!
//! The tracker keeps one baseline fingerprint in the store and compares it
//! with whatever the verifier reports now. A changed enrollment always drops
//! the old baseline, so the next check starts from the new enrollment.

use crate::error::{GateError, GateErrorExt};
use crate::verifier::BiometricVerifier;
use biogate_domain::domain_state::{DomainCheck, DomainState};
use biogate_storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct DomainStateTracker<V, S> {
    verifier: Arc<V>,
    store: S,
    key: Arc<str>,
}

impl<V, S: Clone> Clone for DomainStateTracker<V, S> {
    fn clone(&self) -> Self {
        Self { verifier: Arc::clone(&self.verifier), store: self.store.clone(), key: Arc::clone(&self.key) }
    }
}

impl<V: BiometricVerifier, S: KeyValueStore> DomainStateTracker<V, S> {
    pub fn new(verifier: Arc<V>, store: S, key: impl Into<Arc<str>>) -> Self {
        Self { verifier, store, key: key.into() }
    }

    /// The enrollment fingerprint as the platform reports it right now.
    pub async fn current_fingerprint(&self) -> Option<DomainState> {
        self.verifier.current_enrollment_fingerprint().await.map(DomainState::from)
    }

    /// The stored baseline, if one was ever accepted.
    ///
    /// # Errors
    /// Returns [`GateError::Storage`] if the read fails.
    pub async fn baseline(&self) -> Result<Option<DomainState>, GateError> {
        let raw = self.store.get(&self.key).await.context("Reading enrollment baseline")?;
        Ok(raw.map(DomainState::from))
    }

    /// Compares the current enrollment with the baseline.
    ///
    /// - No baseline: the current fingerprint (if any) becomes the baseline.
    /// - Same fingerprint, or the platform reports none: nothing changes.
    /// - Different fingerprint: the baseline is removed. With `force_fail` the
    ///   change is reported as [`GateError::DomainStateChanged`], otherwise it is
    ///   tolerated and the next check records the new enrollment.
    ///
    /// # Errors
    /// [`GateError::DomainStateChanged`] in strict mode, or
    /// [`GateError::Storage`] when the baseline cannot be read or written.
    pub async fn check_and_maybe_accept(&self, force_fail: bool) -> Result<DomainCheck, GateError> {
        let current = self.current_fingerprint().await;
        let Some(baseline) = self.baseline().await? else {
            if let Some(current) = current {
                self.store
                    .set(&self.key, current.as_bytes())
                    .await
                    .context("Storing enrollment baseline")?;
                info!(fingerprint = ?current, "Enrollment baseline recorded");
            }
            return Ok(DomainCheck::Accepted);
        };

        match current {
            Some(current) if current != baseline => {
                self.reset().await?;
                if force_fail {
                    warn!("Biometric enrollment changed since last check");
                    return Err(GateError::DomainStateChanged {
                        message: "enrolled credentials differ from the stored baseline".into(),
                        context: None,
                    });
                }
                warn!("Biometric enrollment changed; tolerated, baseline dropped");
                Ok(DomainCheck::Accepted)
            },
            Some(_) => Ok(DomainCheck::Unchanged),
            None => {
                debug!("Platform reported no enrollment fingerprint; baseline kept");
                Ok(DomainCheck::Unchanged)
            },
        }
    }

    /// Forgets the baseline. The next check records a fresh one.
    ///
    /// # Errors
    /// Returns [`GateError::Storage`] if the removal fails.
    pub async fn reset(&self) -> Result<(), GateError> {
        self.store.remove(&self.key).await.context("Removing enrollment baseline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockVerifier;
    use biogate_domain::constants::DOMAIN_STATE_KEY;
    use biogate_storage::MemoryStore;

    fn tracker(verifier: &MockVerifier) -> (DomainStateTracker<MockVerifier, MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        (DomainStateTracker::new(Arc::new(verifier.clone()), store.clone(), DOMAIN_STATE_KEY), store)
    }

    #[tokio::test]
    async fn test_first_check_records_baseline() {
        let verifier = MockVerifier::new().with_fingerprint([1, 2]);
        let (tracker, store) = tracker(&verifier);

        assert_eq!(tracker.check_and_maybe_accept(true).await.unwrap(), DomainCheck::Accepted);
        assert_eq!(store.get(DOMAIN_STATE_KEY).await.unwrap(), Some(vec![1, 2]));
        assert_eq!(tracker.check_and_maybe_accept(true).await.unwrap(), DomainCheck::Unchanged);
    }

    #[tokio::test]
    async fn test_no_fingerprint_writes_nothing() {
        let verifier = MockVerifier::new();
        let (tracker, store) = tracker(&verifier);

        assert_eq!(tracker.check_and_maybe_accept(true).await.unwrap(), DomainCheck::Accepted);
        assert_eq!(store.get(DOMAIN_STATE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_strict_change_fails_once_then_rebaselines() {
        let verifier = MockVerifier::new().with_fingerprint([1]);
        let (tracker, store) = tracker(&verifier);
        tracker.check_and_maybe_accept(true).await.unwrap();

        verifier.set_fingerprint(Some(vec![2]));
        let err = tracker.check_and_maybe_accept(true).await.unwrap_err();
        assert!(matches!(err, GateError::DomainStateChanged { .. }));
        assert_eq!(store.get(DOMAIN_STATE_KEY).await.unwrap(), None);

        assert_eq!(tracker.check_and_maybe_accept(true).await.unwrap(), DomainCheck::Accepted);
        assert_eq!(store.get(DOMAIN_STATE_KEY).await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_lenient_change_is_tolerated() {
        let verifier = MockVerifier::new().with_fingerprint([1]);
        let (tracker, _store) = tracker(&verifier);
        tracker.check_and_maybe_accept(false).await.unwrap();

        verifier.set_fingerprint(Some(vec![2]));
        assert_eq!(tracker.check_and_maybe_accept(false).await.unwrap(), DomainCheck::Accepted);
        assert_eq!(tracker.baseline().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_current_keeps_baseline() {
        let verifier = MockVerifier::new().with_fingerprint([7]);
        let (tracker, _store) = tracker(&verifier);
        tracker.check_and_maybe_accept(true).await.unwrap();

        verifier.set_fingerprint(None);
        assert_eq!(tracker.check_and_maybe_accept(true).await.unwrap(), DomainCheck::Unchanged);
        assert_eq!(tracker.baseline().await.unwrap(), Some(DomainState::from(vec![7])));
    }
}
