use crate::constants::{DOMAIN_STATE_KEY, FEATURES_KEY};
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration shared across the gate and its callers.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfigInner {
    pub gate: GateConfig,
    pub storage: StorageConfig,
    pub verifier: VerifierConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(flatten, default)]
    inner: Arc<AppConfigInner>,
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Gate policy and the store keys it persists under.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Treat a changed enrollment as a fatal error instead of silently re-baselining.
    pub force_fail_on_change: bool,
    pub features_key: String,
    pub domain_state_key: String,
}

/// Where and how the durable key-value store keeps its records.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub compression: StorageCompression,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageCompression {
    #[default]
    None,
    Lz4,
}

/// External helper that bridges to the platform biometric service.
///
/// No `program` means the platform has no biometric support.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub program: Option<PathBuf>,
    pub args: Vec<String>,
}

/// Console and rolling-file log output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub console: bool,
    pub level: String,
    pub directory: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            force_fail_on_change: true,
            features_key: FEATURES_KEY.to_owned(),
            domain_state_key: DOMAIN_STATE_KEY.to_owned(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from("."), compression: StorageCompression::None }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { console: true, level: "info".to_owned(), directory: None, json: false }
    }
}
