use super::{BiometricVerifier, VerifierError};
use std::borrow::Cow;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

const OP_PROBE: &str = "probe";
const OP_ENROLLMENT: &str = "enrollment";
const OP_EVALUATE: &str = "evaluate";

/// Delegates to an external helper that talks to the platform biometric service.
///
/// One helper invocation per call, with the operation appended after the
/// configured arguments:
///
/// | invocation | success output |
/// |---|---|
/// | `<program> [args..] probe` | `1` when a policy can be evaluated |
/// | `<program> [args..] enrollment` | hex fingerprint, empty when none |
/// | `<program> [args..] evaluate <reason>` | `1` granted, `0` rejected |
///
/// A non-zero exit from `evaluate` is a platform failure: `2` cancelled,
/// `3` lockout, `4` not enrolled, `5` unavailable, anything else failed. The
/// trimmed stderr becomes the error description.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandVerifier {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    #[must_use]
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    async fn run(&self, op: &[&str]) -> std::io::Result<Output> {
        debug!(program = %self.program.display(), op = op.first().copied().unwrap_or_default(), "Invoking verifier helper");
        Command::new(&self.program)
            .args(&self.args)
            .args(op)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
    }
}

impl BiometricVerifier for CommandVerifier {
    async fn can_authenticate(&self) -> bool {
        match self.run(&[OP_PROBE]).await {
            Ok(out) => out.status.success() && stdout_of(&out) == "1",
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "Verifier probe failed");
                false
            },
        }
    }

    async fn current_enrollment_fingerprint(&self) -> Option<Vec<u8>> {
        let out = match self.run(&[OP_ENROLLMENT]).await {
            Ok(out) if out.status.success() => out,
            Ok(out) => {
                warn!(status = %out.status, stderr = %stderr_of(&out), "Verifier enrollment query failed");
                return None;
            },
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "Verifier enrollment query failed");
                return None;
            },
        };

        let encoded = stdout_of(&out);
        if encoded.is_empty() {
            return None;
        }

        match hex::decode(encoded) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "Verifier returned a malformed enrollment fingerprint");
                None
            },
        }
    }

    async fn evaluate(&self, reason: &str) -> Result<bool, VerifierError> {
        let out = self.run(&[OP_EVALUATE, reason]).await.map_err(|source| VerifierError::Io {
            source,
            context: Some(format!("Failed to run {}", self.program.display()).into()),
        })?;

        if out.status.success() {
            return match stdout_of(&out) {
                "1" => {
                    info!("Biometric challenge granted");
                    Ok(true)
                },
                "0" => {
                    info!("Biometric challenge rejected");
                    Ok(false)
                },
                other => Err(VerifierError::Failed {
                    message: format!("unexpected helper output {other:?}").into(),
                    context: Some("Evaluate".into()),
                }),
            };
        }

        Err(error_from_exit(out.status.code(), stderr_of(&out)))
    }
}

fn stdout_of(out: &Output) -> &str {
    std::str::from_utf8(&out.stdout).map_or("", str::trim)
}

fn stderr_of(out: &Output) -> Cow<'_, str> {
    String::from_utf8_lossy(&out.stderr).trim().to_owned().into()
}

fn error_from_exit(code: Option<i32>, stderr: Cow<'_, str>) -> VerifierError {
    let message: Cow<'static, str> = if stderr.is_empty() {
        code.map_or_else(
            || Cow::Borrowed("helper terminated by signal"),
            |c| Cow::Owned(format!("helper exited with status {c}")),
        )
    } else {
        Cow::Owned(stderr.into_owned())
    };

    match code {
        Some(2) => VerifierError::Cancelled { message, context: None },
        Some(3) => VerifierError::Lockout { message, context: None },
        Some(4) => VerifierError::NotEnrolled { message, context: None },
        Some(5) => VerifierError::Unavailable { message, context: None },
        _ => VerifierError::Failed { message, context: None },
    }
}
