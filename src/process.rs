//! Process execution seam for the `security` tool.
//!
//! Everything the keychain controller knows about the outside world arrives
//! through [`CommandRunner`]: an executable, an argument list, and back comes a
//! [`CommandOutcome`]. Spawn failures (missing binary, permission denied on the
//! executable itself) are errors; a child that runs and exits non-zero is an
//! outcome, because for probes a non-zero exit is an expected answer.

use crate::error::{Result, TrustError};
use std::future::Future;

/// Result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exit status zero, with captured standard output.
    Success { stdout: String },
    /// Non-zero exit (or killed by signal), with the tool's diagnostic text.
    Failure { code: Option<i32>, diagnostic: String },
}

impl CommandOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Build an outcome from raw process output.
    ///
    /// The diagnostic is stderr, falling back to stdout when stderr is blank;
    /// `security` prints some failures to stdout only.
    #[must_use]
    pub fn from_output(output: &std::process::Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Self::Success { stdout };
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let diagnostic = if stderr.trim().is_empty() { stdout } else { stderr };

        Self::Failure {
            code: output.status.code(),
            diagnostic,
        }
    }
}

/// Runs an executable to completion and reports how it went.
pub trait CommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
    ) -> impl Future<Output = Result<CommandOutcome>> + Send;
}

/// [`CommandRunner`] backed by `tokio::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutcome> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TrustError::MissingDependency(format!(
                        "{program} not found. This tool requires macOS with the security framework."
                    ))
                } else {
                    TrustError::CommandExecution(format!("Failed to execute {program}: {e}"))
                }
            })?;

        Ok(CommandOutcome::from_output(&output))
    }
}
