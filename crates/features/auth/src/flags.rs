//! Persistent feature-name-to-flag mapping.
//!
//! The whole mapping lives under one store key as a JSON object
//! (`{"vault": true, "export": false}`). Writes go through a single
//! [`KeyValueStore::update`] call so concurrent toggles of different features
//! never lose each other.

use crate::error::{GateError, GateErrorExt};
use biogate_domain::features::{FeatureName, FeatureState};
use biogate_storage::KeyValueStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type FlagMap = BTreeMap<String, bool>;

#[derive(Debug, Clone)]
pub struct FeatureFlagStore<S> {
    store: S,
    key: Arc<str>,
}

impl<S: KeyValueStore> FeatureFlagStore<S> {
    pub fn new(store: S, key: impl Into<Arc<str>>) -> Self {
        Self { store, key: key.into() }
    }

    /// The persisted flag; `false` for features that were never configured.
    ///
    /// # Errors
    /// Only persistence failures; a missing key or feature is not an error.
    pub async fn is_enabled(&self, name: &FeatureName) -> Result<bool, GateError> {
        Ok(self.state(name).await?.is_gated())
    }

    /// Upserts the flag for `name`. Idempotent; persisted before returning.
    ///
    /// # Errors
    /// Returns [`GateError::Storage`] if the write fails, or [`GateError::Codec`]
    /// if the stored mapping is not valid JSON.
    pub async fn set_enabled(&self, name: &FeatureName, enabled: bool) -> Result<(), GateError> {
        let feature = name.as_str().to_owned();
        self.store
            .update(&self.key, move |current| {
                let mut flags = decode(current.as_deref())?;
                flags.insert(feature, enabled);
                serde_json::to_vec(&flags).context("Encoding feature mapping")
            })
            .await?;
        debug!(feature = %name, enabled, "Feature flag persisted");
        Ok(())
    }

    /// Distinguishes never-configured features from explicitly disabled ones.
    ///
    /// # Errors
    /// See [`FeatureFlagStore::features`].
    pub async fn state(&self, name: &FeatureName) -> Result<FeatureState, GateError> {
        let flags = self.features().await?;
        Ok(FeatureState::from(flags.get(name.as_str()).copied()))
    }

    /// Every configured feature with its flag, sorted by name.
    ///
    /// # Errors
    /// Returns [`GateError::Storage`] if the read fails, or [`GateError::Codec`]
    /// if the stored mapping is not valid JSON.
    pub async fn features(&self) -> Result<BTreeMap<String, bool>, GateError> {
        let raw = self.store.get(&self.key).await.context("Reading feature mapping")?;
        decode(raw.as_deref())
    }
}

fn decode(raw: Option<&[u8]>) -> Result<FlagMap, GateError> {
    raw.map_or_else(
        || Ok(FlagMap::new()),
        |bytes| serde_json::from_slice(bytes).context("Decoding feature mapping"),
    )
}
