use crate::domain_state::DomainStateTracker;
use crate::error::{GateError, GateErrorExt};
use crate::flags::FeatureFlagStore;
use crate::verifier::BiometricVerifier;
use biogate_domain::config::GateConfig;
use biogate_domain::constants::{DOMAIN_STATE_KEY, FEATURES_KEY};
use biogate_domain::domain_state::DomainState;
use biogate_domain::features::{FeatureName, FeatureState};
use biogate_storage::KeyValueStore;
use private::Sealed;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Store keys the gate persists under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub features: String,
    pub domain_state: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self { features: FEATURES_KEY.to_owned(), domain_state: DOMAIN_STATE_KEY.to_owned() }
    }
}

/// The internal shared state of a [`BiometricGate`].
#[derive(Debug)]
pub struct BiometricGateInner<V, S> {
    verifier: Arc<V>,
    flags: FeatureFlagStore<S>,
    tracker: DomainStateTracker<V, S>,
    force_fail_on_change: bool,
}

/// Per-feature biometric gating.
///
/// Each feature is `Unconfigured` until enabled. Enabling requires a capable
/// platform; disabling a gated feature and accessing it require a successful
/// challenge. Every enable, disable and access call first checks capability and
/// the enrollment baseline, so a platform that lost its biometrics reports
/// [`GateError::AuthenticationNotAvailable`] instead of letting gated features
/// through.
///
/// Clones share the verifier, the store and the policy.
///
/// # Example
///
/// ```rust
/// use biogate_auth::{BiometricGate, GateError, mock::MockVerifier};
/// use biogate_storage::MemoryStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), GateError> {
///     let verifier = MockVerifier::new().with_fingerprint([1, 2, 3]);
///     let gate = BiometricGate::builder()
///         .verifier(verifier.clone())
///         .store(MemoryStore::new())
///         .build();
///
///     // Not gated yet: access is granted without a prompt.
///     assert!(gate.request_authentication("vault", "Unlock vault").await?);
///     assert_eq!(verifier.challenge_count(), 0);
///
///     assert!(gate.enable("vault").await?);
///     verifier.push_response(Ok(false));
///     assert!(!gate.request_authentication("vault", "Unlock vault").await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct BiometricGate<V, S> {
    inner: Arc<BiometricGateInner<V, S>>,
}

impl<V, S> Clone for BiometricGate<V, S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V, S> Deref for BiometricGate<V, S> {
    type Target = BiometricGateInner<V, S>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl BiometricGate<(), ()> {
    #[must_use = "The gate is not usable until you call .build()"]
    pub fn builder() -> BiometricGateBuilder {
        BiometricGateBuilder::new()
    }
}

impl<V: BiometricVerifier, S: KeyValueStore> BiometricGate<V, S> {
    /// Builds a gate from the `[gate]` section of the application config.
    pub fn from_config(config: &GateConfig, verifier: V, store: S) -> Self {
        BiometricGateBuilder::new()
            .verifier(verifier)
            .store(store)
            .force_fail_on_change(config.force_fail_on_change)
            .keys(StoreKeys {
                features: config.features_key.clone(),
                domain_state: config.domain_state_key.clone(),
            })
            .build()
    }

    #[must_use]
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    #[must_use]
    pub fn force_fail_on_change(&self) -> bool {
        self.force_fail_on_change
    }

    /// Whether the platform can evaluate a biometric policy.
    ///
    /// Also compares the enrollment with the stored baseline, recording one on
    /// first use. The check runs even when the platform is not capable.
    ///
    /// # Errors
    ///
    /// [`GateError::DomainStateChanged`] when the enrollment changed and the
    /// gate is strict. The baseline is already dropped at that point, so the
    /// next call succeeds and records the new enrollment.
    #[instrument(skip(self), level = "debug")]
    pub async fn is_available(&self) -> Result<bool, GateError> {
        let capable = self.verifier.can_authenticate().await;
        let check = self.tracker.check_and_maybe_accept(self.force_fail_on_change).await?;
        debug!(capable, ?check, "Availability checked");
        Ok(capable)
    }

    /// Whether `feature` currently requires authentication. Never prompts.
    ///
    /// # Errors
    /// [`GateError::InvalidFeature`] for empty names, or a persistence failure.
    pub async fn is_feature_gated(&self, feature: impl AsRef<str>) -> Result<bool, GateError> {
        let name = feature_name(feature)?;
        self.flags.is_enabled(&name).await
    }

    /// # Errors
    /// [`GateError::InvalidFeature`] for empty names, or a persistence failure.
    pub async fn feature_state(&self, feature: impl AsRef<str>) -> Result<FeatureState, GateError> {
        let name = feature_name(feature)?;
        self.flags.state(&name).await
    }

    /// Every configured feature with its flag.
    ///
    /// # Errors
    /// Persistence failures only.
    pub async fn features(&self) -> Result<BTreeMap<String, bool>, GateError> {
        self.flags.features().await
    }

    /// Turns gating on for `feature`.
    ///
    /// Returns `Ok(false)` without touching the flag when the platform cannot
    /// authenticate. Enabling an already enabled feature is a no-op success.
    ///
    /// # Errors
    /// [`GateError::DomainStateChanged`], [`GateError::InvalidFeature`], or a
    /// persistence failure.
    #[instrument(skip(self, feature), fields(feature = feature.as_ref()))]
    pub async fn enable(&self, feature: impl AsRef<str>) -> Result<bool, GateError> {
        let name = feature_name(feature)?;
        if !self.is_available().await? {
            info!(%name, "Biometrics unavailable; feature left ungated");
            return Ok(false);
        }

        self.flags.set_enabled(&name, true).await?;
        info!(%name, "Feature gated behind biometrics");
        Ok(true)
    }

    /// Turns gating off for `feature`.
    ///
    /// A gated feature is only released after a successful challenge; a clean
    /// rejection returns `Ok(false)` and keeps it gated. A feature that is not
    /// gated is marked disabled without prompting.
    ///
    /// # Errors
    /// [`GateError::AuthenticationNotAvailable`] when the platform cannot
    /// authenticate, [`GateError::Verifier`] when the challenge fails, plus
    /// the errors of [`BiometricGate::is_available`].
    #[instrument(skip(self, feature, reason), fields(feature = feature.as_ref()))]
    pub async fn disable(&self, feature: impl AsRef<str>, reason: &str) -> Result<bool, GateError> {
        let name = feature_name(feature)?;
        self.ensure_available().await?;

        if self.flags.is_enabled(&name).await? {
            let granted = self.verifier.evaluate(reason).await.context("Disable challenge")?;
            if !granted {
                info!(%name, "Challenge rejected; feature stays gated");
                return Ok(false);
            }
        }

        self.flags.set_enabled(&name, false).await?;
        info!(%name, "Feature no longer gated");
        Ok(true)
    }

    /// Authorizes one access to `feature`.
    ///
    /// Features that are not gated are granted without a prompt. Gated features
    /// return exactly what the challenge returns.
    ///
    /// # Errors
    /// [`GateError::AuthenticationNotAvailable`] when the platform cannot
    /// authenticate, [`GateError::Verifier`] when the challenge fails, plus
    /// the errors of [`BiometricGate::is_available`].
    #[instrument(skip(self, feature, reason), fields(feature = feature.as_ref()))]
    pub async fn request_authentication(
        &self,
        feature: impl AsRef<str>,
        reason: &str,
    ) -> Result<bool, GateError> {
        let name = feature_name(feature)?;
        self.ensure_available().await?;

        if !self.flags.is_enabled(&name).await? {
            debug!(%name, "Feature not gated; access granted");
            return Ok(true);
        }

        let granted = self.verifier.evaluate(reason).await.context("Access challenge")?;
        info!(%name, granted, "Access challenge completed");
        Ok(granted)
    }

    /// The stored enrollment baseline, if any.
    ///
    /// # Errors
    /// Persistence failures only.
    pub async fn domain_baseline(&self) -> Result<Option<DomainState>, GateError> {
        self.tracker.baseline().await
    }

    /// Forgets the enrollment baseline; the next availability check records a
    /// fresh one. Feature flags are untouched.
    ///
    /// # Errors
    /// Persistence failures only.
    pub async fn reset_domain_state(&self) -> Result<(), GateError> {
        self.tracker.reset().await?;
        info!("Enrollment baseline cleared");
        Ok(())
    }

    async fn ensure_available(&self) -> Result<(), GateError> {
        if self.is_available().await? {
            return Ok(());
        }
        Err(GateError::AuthenticationNotAvailable {
            message: "the platform cannot evaluate a biometric policy".into(),
            context: None,
        })
    }
}

fn feature_name(feature: impl AsRef<str>) -> Result<FeatureName, GateError> {
    Ok(FeatureName::try_from(feature.as_ref())?)
}

// --- Builder ---

#[derive(Debug, Default)]
pub struct NoVerifier;
#[derive(Debug)]
pub struct WithVerifier<V>(V);

#[derive(Debug, Default)]
pub struct NoStore;
#[derive(Debug)]
pub struct WithStore<S>(S);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoVerifier {}
impl<V> Sealed for WithVerifier<V> {}
impl Sealed for NoStore {}
impl<S> Sealed for WithStore<S> {}

#[derive(Debug, Clone)]
struct GatePolicy {
    force_fail_on_change: bool,
    keys: StoreKeys,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self { force_fail_on_change: true, keys: StoreKeys::default() }
    }
}

/// Typestate builder for [`BiometricGate`]: `build` only exists once both a
/// verifier and a store were supplied.
#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct BiometricGateBuilder<V: Sealed = NoVerifier, S: Sealed = NoStore> {
    verifier: V,
    store: S,
    policy: GatePolicy,
}

#[allow(private_bounds)]
impl<V: Sealed, S: Sealed> BiometricGateBuilder<V, S> {
    /// Strict mode (the default) reports an enrollment change as an error
    /// once; lenient mode re-baselines silently.
    #[must_use = "Sets how enrollment changes are reported"]
    pub const fn force_fail_on_change(mut self, enable: bool) -> Self {
        self.policy.force_fail_on_change = enable;
        self
    }

    #[must_use = "Sets the store keys the gate persists under"]
    pub fn keys(mut self, keys: StoreKeys) -> Self {
        self.policy.keys = keys;
        self
    }
}

impl BiometricGateBuilder {
    #[must_use = "Creates a new gate builder with default policy"]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(private_bounds)]
impl<S: Sealed> BiometricGateBuilder<NoVerifier, S> {
    #[must_use = "Sets the platform verifier"]
    pub fn verifier<V: BiometricVerifier>(self, verifier: V) -> BiometricGateBuilder<WithVerifier<V>, S> {
        BiometricGateBuilder { verifier: WithVerifier(verifier), store: self.store, policy: self.policy }
    }
}

#[allow(private_bounds)]
impl<V: Sealed> BiometricGateBuilder<V, NoStore> {
    #[must_use = "Sets the durable store"]
    pub fn store<S: KeyValueStore>(self, store: S) -> BiometricGateBuilder<V, WithStore<S>> {
        BiometricGateBuilder { verifier: self.verifier, store: WithStore(store), policy: self.policy }
    }
}

impl<V: BiometricVerifier, S: KeyValueStore> BiometricGateBuilder<WithVerifier<V>, WithStore<S>> {
    #[must_use]
    pub fn build(self) -> BiometricGate<V, S> {
        let verifier = Arc::new(self.verifier.0);
        let store = self.store.0;
        let GatePolicy { force_fail_on_change, keys } = self.policy;

        BiometricGate {
            inner: Arc::new(BiometricGateInner {
                verifier: Arc::clone(&verifier),
                flags: FeatureFlagStore::new(store.clone(), keys.features),
                tracker: DomainStateTracker::new(verifier, store, keys.domain_state),
                force_fail_on_change,
            }),
        }
    }
}
