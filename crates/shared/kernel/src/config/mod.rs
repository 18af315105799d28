use biogate_domain::config::AppConfig;
use biogate_domain::constants::{DEFAULT_CONFIG, ENV_PREFIX};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Custom error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

pub trait ConfigErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// Loads a configuration structure from a file layered with environment overrides.
///
/// 1. **Base File**: Loads settings from `path` (any extension the `config` crate
///    understands). Defaults to `biogate` in the working directory.
/// 2. **Environment Overrides**: Overlays variables prefixed with `BIOGATE__`.
///    Nested keys use double underscores (`BIOGATE__GATE__FORCE_FAIL_ON_CHANGE`
///    maps to `gate.force_fail_on_change`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or unreadable, or if
/// the merged sources do not deserialize into `T`.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(env_source());

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Loads [`AppConfig`], falling back to defaults plus environment overrides
/// when no configuration file exists.
///
/// An explicitly requested file must exist; only the implicit default may be absent.
///
/// # Errors
/// Returns [`ConfigError::Config`] if a present file is malformed or an override
/// has the wrong type.
pub fn load_app_config(path: Option<impl AsRef<Path>>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = path {
        return load_config(Some(path));
    }

    let builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG).required(false))
        .add_source(env_source());

    builder
        .build()
        .context("Failed to build default config")?
        .try_deserialize::<AppConfig>()
        .context("Failed to deserialize default config")
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .convert_case(config::Case::Snake)
        .try_parsing(true)
}
