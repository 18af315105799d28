use biogate_auth::mock::MockVerifier;
use biogate_auth::*;
use biogate_domain::config::GateConfig;
use biogate_storage::{FileStore, KeyValueStore, MemoryStore, StoreOptions};
use proptest::prelude::*;
use tempfile::TempDir;

fn gate(verifier: &MockVerifier) -> BiometricGate<MockVerifier, MemoryStore> {
    BiometricGate::builder().verifier(verifier.clone()).store(MemoryStore::new()).build()
}

fn capable() -> MockVerifier {
    MockVerifier::new().with_fingerprint([0xaa, 0xbb])
}

// --- availability and enrollment ---

#[tokio::test]
async fn test_first_availability_check_never_fails() {
    let verifier = capable();
    let gate = gate(&verifier);

    assert!(gate.is_available().await.unwrap());
    assert_eq!(gate.domain_baseline().await.unwrap(), Some(DomainState::from(vec![0xaa, 0xbb])));
}

#[tokio::test]
async fn test_unavailable_platform_reports_false() {
    let verifier = MockVerifier::unavailable();
    let gate = gate(&verifier);

    assert!(!gate.is_available().await.unwrap());
    assert_eq!(gate.domain_baseline().await.unwrap(), None);
}

#[tokio::test]
async fn test_strict_enrollment_change_fails_once_then_rebaselines() {
    let verifier = capable();
    let gate = gate(&verifier);
    assert!(gate.is_available().await.unwrap());

    verifier.set_fingerprint(Some(vec![0xcc]));
    let err = gate.is_available().await.unwrap_err();
    assert!(matches!(err, GateError::DomainStateChanged { .. }), "{err:?}");

    assert!(gate.is_available().await.unwrap());
    assert_eq!(gate.domain_baseline().await.unwrap(), Some(DomainState::from(vec![0xcc])));
    assert!(gate.is_available().await.unwrap());
}

#[tokio::test]
async fn test_lenient_enrollment_change_is_tolerated() {
    let verifier = capable();
    let gate = BiometricGate::builder()
        .verifier(verifier.clone())
        .store(MemoryStore::new())
        .force_fail_on_change(false)
        .build();
    assert!(gate.is_available().await.unwrap());

    verifier.set_fingerprint(Some(vec![0xcc]));
    assert!(gate.is_available().await.unwrap());
    assert!(gate.is_available().await.unwrap());
    assert_eq!(gate.domain_baseline().await.unwrap(), Some(DomainState::from(vec![0xcc])));
}

#[tokio::test]
async fn test_enrollment_change_leaves_flags_untouched() {
    let verifier = capable();
    let gate = gate(&verifier);
    assert!(gate.enable("vault").await.unwrap());

    verifier.set_fingerprint(Some(vec![0x01]));
    assert!(matches!(gate.enable("export").await, Err(GateError::DomainStateChanged { .. })));

    assert!(gate.is_feature_gated("vault").await.unwrap());
    assert_eq!(gate.feature_state("export").await.unwrap(), FeatureState::Unconfigured);
}

#[tokio::test]
async fn test_reset_domain_state_rebaselines() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.is_available().await.unwrap();

    gate.reset_domain_state().await.unwrap();
    assert_eq!(gate.domain_baseline().await.unwrap(), None);

    verifier.set_fingerprint(Some(vec![0x42]));
    assert!(gate.is_available().await.unwrap());
    assert_eq!(gate.domain_baseline().await.unwrap(), Some(DomainState::from(vec![0x42])));
}

// --- enable ---

#[tokio::test]
async fn test_enable_gates_feature() {
    let verifier = capable();
    let gate = gate(&verifier);

    assert!(gate.enable("vault").await.unwrap());
    assert!(gate.is_feature_gated("vault").await.unwrap());
    assert_eq!(gate.feature_state("vault").await.unwrap(), FeatureState::Enabled);
    assert_eq!(verifier.challenge_count(), 0);
}

#[tokio::test]
async fn test_enable_when_unavailable_persists_nothing() {
    let verifier = MockVerifier::unavailable();
    let gate = gate(&verifier);

    assert!(!gate.enable("vault").await.unwrap());
    assert!(!gate.is_feature_gated("vault").await.unwrap());
    assert!(gate.features().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_enable_is_idempotent() {
    let verifier = capable();
    let gate = gate(&verifier);

    assert!(gate.enable("vault").await.unwrap());
    let once = gate.features().await.unwrap();
    assert!(gate.enable("vault").await.unwrap());
    assert_eq!(gate.features().await.unwrap(), once);
}

#[tokio::test]
async fn test_feature_names_are_trimmed() {
    let verifier = capable();
    let gate = gate(&verifier);

    assert!(gate.enable("  Passcode Screen Auth ").await.unwrap());
    assert!(gate.is_feature_gated("Passcode Screen Auth").await.unwrap());
}

#[tokio::test]
async fn test_empty_feature_name_is_rejected() {
    let verifier = capable();
    let gate = gate(&verifier);

    for name in ["", "   "] {
        let err = gate.enable(name).await.unwrap_err();
        assert!(matches!(err, GateError::InvalidFeature { .. }), "{name:?}: {err:?}");
    }
}

// --- disable ---

#[tokio::test]
async fn test_disable_ungated_feature_skips_challenge() {
    let verifier = capable();
    let gate = gate(&verifier);

    assert!(gate.disable("vault", "Turn off vault lock").await.unwrap());
    assert_eq!(verifier.challenge_count(), 0);
    assert_eq!(gate.feature_state("vault").await.unwrap(), FeatureState::Disabled);
}

#[tokio::test]
async fn test_disable_gated_feature_requires_challenge() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.enable("vault").await.unwrap();

    assert!(gate.disable("vault", "Turn off vault lock").await.unwrap());
    assert_eq!(verifier.challenges(), vec!["Turn off vault lock"]);
    assert_eq!(gate.feature_state("vault").await.unwrap(), FeatureState::Disabled);
}

#[tokio::test]
async fn test_disable_rejected_keeps_feature_gated() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.enable("vault").await.unwrap();

    verifier.push_response(Ok(false));
    assert!(!gate.disable("vault", "Turn off vault lock").await.unwrap());
    assert!(gate.is_feature_gated("vault").await.unwrap());
}

#[tokio::test]
async fn test_disable_verifier_error_keeps_feature_gated() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.enable("vault").await.unwrap();

    verifier.push_response(Err(VerifierError::cancelled("user tapped cancel")));
    let err = gate.disable("vault", "Turn off vault lock").await.unwrap_err();
    assert!(matches!(err, GateError::Verifier { ref source, .. } if source.is_cancelled()), "{err:?}");
    assert!(gate.is_feature_gated("vault").await.unwrap());
}

#[tokio::test]
async fn test_disable_when_unavailable_is_an_error() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.enable("vault").await.unwrap();

    verifier.set_available(false);
    let err = gate.disable("vault", "Turn off vault lock").await.unwrap_err();
    assert!(matches!(err, GateError::AuthenticationNotAvailable { .. }), "{err:?}");
    assert!(gate.is_feature_gated("vault").await.unwrap());
    assert_eq!(verifier.challenge_count(), 0);
}

// --- request_authentication ---

#[tokio::test]
async fn test_ungated_access_is_granted_without_challenge() {
    let verifier = capable();
    let gate = gate(&verifier);

    assert!(gate.request_authentication("vault", "unlock").await.unwrap());
    assert_eq!(verifier.challenge_count(), 0);
}

#[tokio::test]
async fn test_gated_access_returns_verifier_result() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.enable("vault").await.unwrap();

    verifier.push_response(Ok(true));
    verifier.push_response(Ok(false));
    assert!(gate.request_authentication("vault", "unlock").await.unwrap());
    assert!(!gate.request_authentication("vault", "unlock").await.unwrap());
    assert_eq!(verifier.challenges(), vec!["unlock", "unlock"]);
}

#[tokio::test]
async fn test_gated_access_surfaces_verifier_errors() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.enable("vault").await.unwrap();

    verifier.push_response(Err(VerifierError::lockout("too many attempts")));
    let err = gate.request_authentication("vault", "unlock").await.unwrap_err();
    assert!(matches!(err, GateError::Verifier { source: VerifierError::Lockout { .. }, .. }), "{err:?}");
}

#[tokio::test]
async fn test_gated_feature_on_lost_capability_is_unavailable_not_ungated() {
    let verifier = capable();
    let gate = gate(&verifier);
    gate.enable("vault").await.unwrap();

    verifier.set_available(false);
    let err = gate.request_authentication("vault", "unlock").await.unwrap_err();
    assert!(matches!(err, GateError::AuthenticationNotAvailable { .. }), "{err:?}");
}

#[tokio::test]
async fn test_vault_lifecycle() {
    let verifier = capable();
    let gate = gate(&verifier);

    assert!(gate.request_authentication("vault", "unlock").await.unwrap());
    assert!(gate.enable("vault").await.unwrap());

    verifier.push_response(Ok(false));
    assert!(!gate.request_authentication("vault", "unlock").await.unwrap());
    assert!(gate.request_authentication("vault", "unlock").await.unwrap());

    assert!(gate.disable("vault", "disable").await.unwrap());
    assert!(gate.request_authentication("vault", "unlock").await.unwrap());
    assert_eq!(verifier.challenges(), vec!["unlock", "unlock", "disable"]);
}

// --- wiring ---

#[tokio::test]
async fn test_from_config_uses_configured_keys() {
    let verifier = capable();
    let store = MemoryStore::new();
    let config = GateConfig {
        force_fail_on_change: false,
        features_key: "custom.features".to_owned(),
        domain_state_key: "custom.domain_state".to_owned(),
    };
    let gate = BiometricGate::from_config(&config, verifier, store.clone());
    assert!(!gate.force_fail_on_change());

    gate.enable("vault").await.unwrap();
    assert_eq!(store.keys().await.unwrap(), vec!["custom.domain_state", "custom.features"]);
}

#[tokio::test]
async fn test_state_survives_reopening_file_store() {
    let temp = TempDir::new().unwrap();
    let verifier = capable();

    {
        let store = FileStore::open(temp.path(), StoreOptions::default()).await.unwrap();
        let gate = BiometricGate::builder().verifier(verifier.clone()).store(store).build();
        assert!(gate.enable("vault").await.unwrap());
    }

    let store = FileStore::open(temp.path(), StoreOptions::existing()).await.unwrap();
    let gate = BiometricGate::builder().verifier(verifier.clone()).store(store).build();
    assert!(gate.is_feature_gated("vault").await.unwrap());
    assert_eq!(gate.domain_baseline().await.unwrap(), Some(DomainState::from(vec![0xaa, 0xbb])));

    verifier.set_fingerprint(Some(vec![0x99]));
    assert!(matches!(gate.is_available().await, Err(GateError::DomainStateChanged { .. })));
}

#[tokio::test]
async fn test_concurrent_enables_are_not_lost() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::open(temp.path(), StoreOptions::default()).await.unwrap();
    let gate = BiometricGate::builder().verifier(capable()).store(store).build();
    gate.is_available().await.unwrap();

    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.enable(format!("feature-{i}")).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().unwrap());
    }

    assert_eq!(gate.features().await.unwrap().len(), 12);
}

proptest! {
    #[test]
    fn prop_never_configured_features_are_not_gated(name in "[A-Za-z][A-Za-z0-9 _.-]{0,24}") {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let verifier = capable();
            let gate = gate(&verifier);

            prop_assert!(!gate.is_feature_gated(&name).await.unwrap());
            prop_assert!(gate.request_authentication(&name, "unlock").await.unwrap());
            prop_assert_eq!(verifier.challenge_count(), 0);
            Ok(())
        })?;
    }
}
