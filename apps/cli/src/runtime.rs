use crate::args::Command;
use crate::commands::{Outcome, execute};
use anyhow::Context;
use biogate_auth::{BiometricGate, BiometricVerifier, CommandVerifier, UnsupportedVerifier};
use biogate_kernel::domain::config::{AppConfig, StorageCompression, StorageConfig};
use biogate_storage::{Compression, FileStore, KeyValueStore, StoreOptions};
use std::io::Write;
use tracing::info;

/// Opens the file store under the configured data directory, creating it if needed.
///
/// # Errors
/// Returns an error if the directory cannot be created or resolved.
pub async fn open_store(config: &StorageConfig) -> anyhow::Result<FileStore> {
    let compression = match config.compression {
        StorageCompression::None => Compression::None,
        StorageCompression::Lz4 => Compression::Lz4,
    };

    let options = StoreOptions { compression, ..StoreOptions::default() };
    FileStore::open(&config.data_dir, options)
        .await
        .with_context(|| format!("Failed to open store at {}", config.data_dir.display()))
}

/// Builds the gate for `config` and runs `command` on it.
///
/// Without a configured helper program the platform is treated as having no
/// biometric support.
///
/// # Errors
/// See [`execute`].
pub async fn run<S: KeyValueStore>(
    config: &AppConfig,
    store: S,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    match &config.verifier.program {
        Some(program) => {
            info!(program = %program.display(), "Using external biometric helper");
            let verifier = CommandVerifier::new(program).with_args(config.verifier.args.iter().cloned());
            run_with(config, verifier, store, command, out).await
        },
        None => {
            info!("No biometric helper configured; biometrics unsupported");
            run_with(config, UnsupportedVerifier, store, command, out).await
        },
    }
}

async fn run_with<V: BiometricVerifier, S: KeyValueStore>(
    config: &AppConfig,
    verifier: V,
    store: S,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let gate = BiometricGate::from_config(&config.gate, verifier, store);
    execute(&gate, command, out).await
}
