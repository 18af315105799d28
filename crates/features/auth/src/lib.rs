//! Biometric feature gating.
//!
//! Callers mark features (identified by name) as requiring biometric
//! authentication and then ask the [`BiometricGate`] before each access:
//!
//! - **[`FeatureFlagStore`]**: the persisted name-to-flag mapping.
//! - **[`DomainStateTracker`]**: remembers the enrolled-credential fingerprint
//!   and notices when it changes.
//! - **[`BiometricGate`]**: the enable/disable/access state machine on top of
//!   both, with an availability check in front of every mutation.
//!
//! The platform itself sits behind [`BiometricVerifier`]; persistence goes
//! through [`biogate_storage::KeyValueStore`].

pub mod domain_state;
pub mod error;
pub mod flags;
pub mod gate;
pub mod mock;
pub mod verifier;

pub use biogate_domain::domain_state::{DomainCheck, DomainState};
pub use biogate_domain::features::{FeatureName, FeatureState};
pub use domain_state::DomainStateTracker;
pub use error::{GateError, GateErrorExt};
pub use flags::FeatureFlagStore;
pub use gate::{BiometricGate, BiometricGateBuilder, StoreKeys};
pub use verifier::{BiometricVerifier, CommandVerifier, UnsupportedVerifier, VerifierError};
