//! Keychain bootstrap workflow
//!
//! Takes a machine from "nothing configured" (or "partly configured") to an
//! unlocked keychain holding every configured certificate:
//! create keychain, unlock it, import each certificate pair, optionally lock.
//! Every step is idempotent, so the workflow can run on every CI job.

use crate::config::BootstrapConfig;
use crate::error::{Result, TrustError};
use crate::macos::keychain::SecurityController;
use crate::macos::output::{Level, Reporter, TerminalReporter};
use crate::macos::validation::{check_security_available, ensure_keychain_parent};
use crate::process::{CommandRunner, SystemCommandRunner};
use fs4::tokio::AsyncFileExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::{BufferWriter, ColorChoice};

const LOCK_FILE_NAME: &str = "keychain-trust.lock";

/// Run every bootstrap step against `controller`, stopping at the first error.
pub async fn bootstrap<R: CommandRunner, L: Reporter>(
    controller: &SecurityController<R, L>,
    config: &BootstrapConfig,
    password: &str,
) -> Result<()> {
    let keychain = config.keychain_path.as_path();

    controller.create_keychain(keychain, password).await?;
    controller.unlock_keychain(keychain, password).await?;

    for certificate in config.certificate_pairs() {
        controller.import_certificate(&certificate, keychain).await?;
    }

    if config.lock_after_import {
        controller.lock_keychain(keychain, password).await?;
    }

    Ok(())
}

/// Human-readable list of the steps [`bootstrap`] would take.
#[must_use]
pub fn plan(config: &BootstrapConfig) -> Vec<String> {
    let keychain = config.keychain_path.display();
    let mut steps = vec![
        format!("Create keychain at {keychain}"),
        format!("Unlock keychain at {keychain}"),
    ];

    for certificate in config.certificate_pairs() {
        steps.push(format!(
            "Import certificate at {}",
            certificate.public_key_path().display()
        ));
        steps.push(format!(
            "Import private key at {}",
            certificate.private_key_path().display()
        ));
    }

    if config.lock_after_import {
        steps.push(format!("Lock keychain at {keychain}"));
    }

    steps
}

/// Print the resolved configuration and its plan.
pub fn show_config(config: &BootstrapConfig) {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = writeln!(&mut buffer, "Keychain:   {}", config.keychain_path.display());
    let _ = writeln!(&mut buffer, "Security:   {}", config.security_path);
    let password_source = match (&config.keychain_password, &config.keychain_password_env) {
        (Some(_), _) => "config file".to_string(),
        (None, Some(name)) => format!("${name}"),
        (None, None) => "empty".to_string(),
    };
    let _ = writeln!(&mut buffer, "Password:   {password_source}");
    let _ = writeln!(&mut buffer, "Certificates: {}", config.certificates.len());
    let _ = writeln!(&mut buffer);
    let _ = writeln!(&mut buffer, "Plan:");
    for (index, step) in plan(config).iter().enumerate() {
        let _ = writeln!(&mut buffer, "  {}. {step}", index + 1);
    }
    let _ = bufwtr.print(&buffer);
}

/// Bootstrap the keychain described by `config` on this machine
pub async fn setup_from_config(config: &BootstrapConfig) -> Result<()> {
    if config.dry_run {
        let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = writeln!(&mut buffer, "Dry run, no changes will be made:");
        for step in plan(config) {
            let _ = writeln!(&mut buffer, "  • {step}");
        }
        let _ = bufwtr.print(&buffer);
        return Ok(());
    }

    check_security_available(&config.security_path).await?;
    let password = config.password()?;

    ensure_keychain_parent(&config.keychain_path).await?;

    // Held until this function returns
    let _lock = BootstrapLock::acquire().await?;

    let reporter = TerminalReporter::new(config.verbose);
    let controller = SecurityController::new(SystemCommandRunner, reporter)
        .with_executable(config.security_path.clone());

    bootstrap(&controller, config, &password).await?;

    reporter.log(
        Level::Info,
        &format!(
            "Keychain ready at {} ({} certificate(s))",
            config.keychain_path.display(),
            config.certificates.len()
        ),
    );

    Ok(())
}

/// Exclusive cross-process lock serializing bootstrap runs
///
/// Released when dropped.
#[derive(Debug)]
pub struct BootstrapLock {
    _file: tokio::fs::File,
    path: PathBuf,
}

impl BootstrapLock {
    /// Acquire the lock in `~/.cache/kodegen` (or the platform cache dir),
    /// blocking while another process holds it.
    pub async fn acquire() -> Result<Self> {
        let lock_dir = dirs::cache_dir()
            .ok_or_else(|| {
                TrustError::MissingConfig("Could not determine cache directory".to_string())
            })?
            .join("kodegen");

        Self::acquire_at(&lock_dir.join(LOCK_FILE_NAME)).await
    }

    pub async fn acquire_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;

        file.lock_exclusive().map_err(|e| {
            TrustError::CommandExecution(format!("Failed to acquire keychain lock: {e}"))
        })?;

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryReporter, StubCommandRunner};

    const SECURITY: &str = "/usr/bin/security";

    fn config(lock_after_import: bool) -> BootstrapConfig {
        let content = format!(
            r#"
keychain_path = "/tmp/kc"
lock_after_import = {lock_after_import}

[[certificates]]
public_key = "/tmp/a.cer"
private_key = "/tmp/a.p12"

[[certificates]]
public_key = "/tmp/b.cer"
private_key = "/tmp/b.p12"
"#
        );
        BootstrapConfig::from_toml(&content, Path::new("/")).unwrap()
    }

    fn stub_happy_path(runner: &StubCommandRunner) {
        runner.error_command(
            &[SECURITY, "create-keychain", "-p", "pw", "/tmp/kc"],
            "A keychain with the same name already exists.",
        );
        runner.succeed_command(&[SECURITY, "unlock-keychain", "-p", "pw", "/tmp/kc"], "");
        runner.succeed_command(&[SECURITY, "find-certificate", "/tmp/a.cer", "-P", ""], "");
        runner.error_command(&[SECURITY, "find-key", "/tmp/a.p12", "-P", ""], "");
        runner.succeed_command(&[SECURITY, "import", "/tmp/a.p12", "-P", "", "-k", "/tmp/kc"], "");
        runner.error_command(&[SECURITY, "find-certificate", "/tmp/b.cer", "-P", ""], "");
        runner.error_command(&[SECURITY, "find-key", "/tmp/b.p12", "-P", ""], "");
        runner.succeed_command(&[SECURITY, "import", "/tmp/b.cer", "-P", "", "-k", "/tmp/kc"], "");
        runner.succeed_command(&[SECURITY, "import", "/tmp/b.p12", "-P", "", "-k", "/tmp/kc"], "");
        runner.succeed_command(&[SECURITY, "lock-keychain", "-p", "pw", "/tmp/kc"], "");
    }

    #[tokio::test]
    async fn runs_steps_in_order() {
        let controller = SecurityController::new(StubCommandRunner::new(), MemoryReporter::new());
        stub_happy_path(controller.runner());

        bootstrap(&controller, &config(true), "pw").await.unwrap();

        let subcommands: Vec<String> = controller
            .runner()
            .invocations()
            .into_iter()
            .map(|command| command[1].clone())
            .collect();
        assert_eq!(
            subcommands,
            vec![
                "create-keychain",
                "unlock-keychain",
                "find-certificate",
                "find-key",
                "import",
                "find-certificate",
                "import",
                "find-key",
                "import",
                "lock-keychain",
            ]
        );
        assert_eq!(
            controller.reporter().messages_at(Level::Debug),
            vec![
                "Keychain at /tmp/kc already exists",
                "Unlocked keychain at /tmp/kc",
                "Skipping importing certificate at /tmp/a.cer because it is already present",
                "Imported certificate private key at /tmp/a.p12",
                "Imported certificate at /tmp/b.cer",
                "Imported certificate private key at /tmp/b.p12",
                "Locked keychain at /tmp/kc",
            ]
        );
    }

    #[tokio::test]
    async fn leaves_keychain_unlocked_by_default() {
        let controller = SecurityController::new(StubCommandRunner::new(), MemoryReporter::new());
        stub_happy_path(controller.runner());

        bootstrap(&controller, &config(false), "pw").await.unwrap();

        assert_eq!(controller.runner().invocation_count("lock-keychain"), 0);
    }

    #[tokio::test]
    async fn stops_at_first_error() {
        let controller = SecurityController::new(StubCommandRunner::new(), MemoryReporter::new());
        let runner = controller.runner();
        runner.succeed_command(&[SECURITY, "create-keychain", "-p", "pw", "/tmp/kc"], "");
        runner.error_command(
            &[SECURITY, "unlock-keychain", "-p", "pw", "/tmp/kc"],
            "security: SecKeychainUnlock /tmp/kc: The user name or passphrase is not correct.",
        );

        let err = bootstrap(&controller, &config(true), "pw").await.unwrap_err();

        assert!(matches!(err, TrustError::KeychainUnlock(_)));
        assert_eq!(runner.invocations().len(), 2);
    }

    #[test]
    fn plan_lists_every_step() {
        assert_eq!(
            plan(&config(true)),
            vec![
                "Create keychain at /tmp/kc",
                "Unlock keychain at /tmp/kc",
                "Import certificate at /tmp/a.cer",
                "Import private key at /tmp/a.p12",
                "Import certificate at /tmp/b.cer",
                "Import private key at /tmp/b.p12",
                "Lock keychain at /tmp/kc",
            ]
        );
    }

    #[tokio::test]
    async fn dry_run_spawns_nothing() {
        let mut config = config(false);
        config.dry_run = true;
        config.security_path = "/nonexistent/security".to_string();

        setup_from_config(&config).await.unwrap();
    }

    #[tokio::test]
    async fn lock_can_be_reacquired_after_drop() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("locks").join(LOCK_FILE_NAME);

        let lock = BootstrapLock::acquire_at(&path).await.unwrap();
        assert_eq!(lock.path(), path.as_path());
        drop(lock);

        BootstrapLock::acquire_at(&path).await.unwrap();
    }
}
