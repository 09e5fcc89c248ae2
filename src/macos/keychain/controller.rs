//! Keychain trust operations over the `security` command line tool

use crate::error::{Result, TrustError};
use crate::macos::output::Reporter;
use crate::process::{CommandOutcome, CommandRunner};
use std::path::Path;

use super::certificate::{ArtifactKind, Certificate};
use super::diagnostics::is_already_exists_diagnostic;

/// Location of the `security` tool on every supported macOS release
pub const DEFAULT_SECURITY_PATH: &str = "/usr/bin/security";

/// Stateless façade over `security` for bootstrapping a build machine's keychain.
///
/// Every mutating operation tolerates the target state already holding:
/// certificates and keys found by a probe are skipped, and a keychain that
/// already exists is left alone. Everything else that fails is returned to the
/// caller with the tool's diagnostic untouched.
///
/// # Example
/// ```no_run
/// # async fn run() -> kodegen_bundler_trust::error::Result<()> {
/// use kodegen_bundler_trust::{
///     Certificate, SecurityController, SystemCommandRunner, TerminalReporter,
/// };
/// use std::path::Path;
///
/// let controller = SecurityController::new(SystemCommandRunner, TerminalReporter::new(true));
/// let keychain = Path::new("/tmp/ci.keychain-db");
/// controller.create_keychain(keychain, "").await?;
/// controller.unlock_keychain(keychain, "").await?;
/// controller
///     .import_certificate(&Certificate::new("dev.cer", "dev.p12"), keychain)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SecurityController<R, L> {
    runner: R,
    reporter: L,
    executable: String,
}

impl<R: CommandRunner, L: Reporter> SecurityController<R, L> {
    #[must_use]
    pub fn new(runner: R, reporter: L) -> Self {
        Self {
            runner,
            reporter,
            executable: DEFAULT_SECURITY_PATH.to_string(),
        }
    }

    /// Use a different `security` executable.
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    #[must_use]
    pub fn reporter(&self) -> &L {
        &self.reporter
    }

    /// Decode a CMS-signed document and return its content.
    ///
    /// Runs `security cms -D -i <path>`. The captured standard output is
    /// returned exactly as the tool produced it.
    pub async fn decode_signed_document(&self, path: &Path) -> Result<String> {
        let path = path_arg(path, "document")?;

        match self.security(&["cms", "-D", "-i", path]).await? {
            CommandOutcome::Success { stdout } => Ok(stdout),
            CommandOutcome::Failure { diagnostic, .. } => Err(TrustError::Decode(diagnostic)),
        }
    }

    /// Import a certificate and its private key into a keychain.
    ///
    /// Each half is probed first and only imported when the probe fails. The
    /// certificate being present does not affect the key, and the other way
    /// round. The certificate is always handled first; an import failure stops
    /// the operation.
    pub async fn import_certificate(
        &self,
        certificate: &Certificate,
        keychain_path: &Path,
    ) -> Result<()> {
        self.import_artifact(
            ArtifactKind::Certificate,
            certificate.public_key_path(),
            keychain_path,
        )
        .await?;

        self.import_artifact(
            ArtifactKind::PrivateKey,
            certificate.private_key_path(),
            keychain_path,
        )
        .await
    }

    /// Create a keychain file protected by `password`.
    ///
    /// A keychain that already exists is not an error.
    pub async fn create_keychain(&self, path: &Path, password: &str) -> Result<()> {
        let keychain = path_arg(path, "keychain")?;

        match self
            .security(&["create-keychain", "-p", password, keychain])
            .await?
        {
            CommandOutcome::Success { .. } => {
                self.reporter
                    .debug(&format!("Created keychain at {}", path.display()));
                Ok(())
            }
            CommandOutcome::Failure { diagnostic, .. }
                if is_already_exists_diagnostic(&diagnostic) =>
            {
                self.reporter
                    .debug(&format!("Keychain at {} already exists", path.display()));
                Ok(())
            }
            CommandOutcome::Failure { diagnostic, .. } => {
                Err(TrustError::KeychainCreate(diagnostic))
            }
        }
    }

    /// Unlock a keychain with `password`.
    pub async fn unlock_keychain(&self, path: &Path, password: &str) -> Result<()> {
        let keychain = path_arg(path, "keychain")?;

        match self
            .security(&["unlock-keychain", "-p", password, keychain])
            .await?
        {
            CommandOutcome::Success { .. } => {
                self.reporter
                    .debug(&format!("Unlocked keychain at {}", path.display()));
                Ok(())
            }
            CommandOutcome::Failure { diagnostic, .. } => {
                Err(TrustError::KeychainUnlock(diagnostic))
            }
        }
    }

    /// Lock a keychain with `password`.
    pub async fn lock_keychain(&self, path: &Path, password: &str) -> Result<()> {
        let keychain = path_arg(path, "keychain")?;

        match self
            .security(&["lock-keychain", "-p", password, keychain])
            .await?
        {
            CommandOutcome::Success { .. } => {
                self.reporter
                    .debug(&format!("Locked keychain at {}", path.display()));
                Ok(())
            }
            CommandOutcome::Failure { diagnostic, .. } => Err(TrustError::KeychainLock(diagnostic)),
        }
    }

    async fn import_artifact(
        &self,
        kind: ArtifactKind,
        path: &Path,
        keychain_path: &Path,
    ) -> Result<()> {
        if self.is_present(kind, path).await? {
            self.reporter.debug(&format!(
                "Skipping importing {kind} at {} because it is already present",
                path.display()
            ));
            return Ok(());
        }

        let artifact = path_arg(path, "artifact")?;
        let keychain = path_arg(keychain_path, "keychain")?;

        match self
            .security(&["import", artifact, "-P", "", "-k", keychain])
            .await?
        {
            CommandOutcome::Success { .. } => {
                self.reporter.debug(&format!(
                    "Imported {} at {}",
                    kind.imported_label(),
                    path.display()
                ));
                Ok(())
            }
            CommandOutcome::Failure { diagnostic, .. } => Err(TrustError::Import {
                kind,
                path: path.to_path_buf(),
                diagnostic,
            }),
        }
    }

    /// Probe the keychain search list for an artifact.
    ///
    /// Any non-zero exit reads as "not present", whatever the reason.
    async fn is_present(&self, kind: ArtifactKind, path: &Path) -> Result<bool> {
        let artifact = path_arg(path, "artifact")?;
        let outcome = self
            .security(&[kind.probe_subcommand(), artifact, "-P", ""])
            .await?;

        Ok(outcome.is_success())
    }

    async fn security(&self, args: &[&str]) -> Result<CommandOutcome> {
        self.runner.run(&self.executable, args).await
    }
}

fn path_arg<'a>(path: &'a Path, what: &str) -> Result<&'a str> {
    path.to_str()
        .ok_or_else(|| {
            TrustError::InvalidConfig(format!("Invalid {what} path: {}", path.display()))
        })
}
