use crate::args::Command;
use anyhow::Context;
use biogate_auth::{BiometricGate, BiometricVerifier};
use biogate_storage::KeyValueStore;
use std::io::Write;
use std::process::ExitCode;

/// How a command ended, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed, granted or available.
    Success,
    /// Rejected by the user, or the platform cannot authenticate.
    Denied,
}

impl From<bool> for Outcome {
    fn from(granted: bool) -> Self {
        if granted { Self::Success } else { Self::Denied }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => Self::SUCCESS,
            Outcome::Denied => Self::FAILURE,
        }
    }
}

/// Runs one command against `gate`, writing its human-readable result to `out`.
///
/// # Errors
/// Gate failures are returned unchanged (wrapped with the command name); so are
/// write failures on `out`.
pub async fn execute<V, S>(
    gate: &BiometricGate<V, S>,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<Outcome>
where
    V: BiometricVerifier,
    S: KeyValueStore,
{
    match command {
        Command::Available => {
            let available = gate.is_available().await.context("available")?;
            writeln!(out, "{}", if available { "available" } else { "unavailable" })?;
            Ok(available.into())
        },
        Command::Status { feature: Some(feature) } => {
            let state = gate.feature_state(&feature).await.context("status")?;
            writeln!(out, "{}: {state}", feature.trim())?;
            Ok(Outcome::Success)
        },
        Command::Status { feature: None } => {
            let features = gate.features().await.context("status")?;
            if features.is_empty() {
                writeln!(out, "no features configured")?;
            }
            for (name, enabled) in &features {
                writeln!(out, "{name}: {}", if *enabled { "enabled" } else { "disabled" })?;
            }
            let baseline = gate.domain_baseline().await.context("status")?;
            let baseline = baseline.map_or_else(|| "none".to_owned(), |b| hex::encode(b.as_bytes()));
            writeln!(out, "domain state: {baseline}")?;
            Ok(Outcome::Success)
        },
        Command::Enable { feature } => {
            let enabled = gate.enable(&feature).await.context("enable")?;
            if enabled {
                writeln!(out, "enabled {}", feature.trim())?;
            } else {
                writeln!(out, "unavailable: {} left ungated", feature.trim())?;
            }
            Ok(enabled.into())
        },
        Command::Disable { feature, reason } => {
            let disabled = gate.disable(&feature, &reason).await.context("disable")?;
            if disabled {
                writeln!(out, "disabled {}", feature.trim())?;
            } else {
                writeln!(out, "denied: {} stays gated", feature.trim())?;
            }
            Ok(disabled.into())
        },
        Command::Request { feature, reason } => {
            let granted = gate.request_authentication(&feature, &reason).await.context("request")?;
            writeln!(out, "{}", if granted { "granted" } else { "denied" })?;
            Ok(granted.into())
        },
        Command::ResetDomainState => {
            gate.reset_domain_state().await.context("reset-domain-state")?;
            writeln!(out, "domain state cleared")?;
            Ok(Outcome::Success)
        },
    }
}
