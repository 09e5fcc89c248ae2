//! Configuration for bootstrapping a build machine's keychain.

use crate::error::{Result, TrustError};
use crate::macos::keychain::{Certificate, DEFAULT_SECURITY_PATH};
use crate::macos::validation::expand_tilde_path;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Environment variable the CLI keychain subcommands fall back to for `--password`
pub const DEFAULT_KEYCHAIN_PASSWORD_ENV: &str = "KEYCHAIN_PASSWORD";

/// Bootstrap configuration, usually read from a TOML file.
///
/// ```toml
/// keychain_path = "~/Library/Keychains/ci.keychain-db"
/// keychain_password_env = "KEYCHAIN_PASSWORD"
/// lock_after_import = true
///
/// [[certificates]]
/// public_key = "signing/dev.cer"
/// private_key = "signing/dev.p12"
/// ```
#[derive(Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Keychain file to create, unlock and import into
    pub keychain_path: PathBuf,

    /// Literal keychain password. Takes precedence over `keychain_password_env`.
    #[serde(default)]
    pub keychain_password: Option<String>,

    /// Name of an environment variable holding the keychain password
    #[serde(default)]
    pub keychain_password_env: Option<String>,

    /// `security` executable
    #[serde(default = "default_security_path")]
    pub security_path: String,

    /// Lock the keychain once every certificate is imported
    #[serde(default)]
    pub lock_after_import: bool,

    #[serde(default)]
    pub certificates: Vec<CertificateConfig>,

    /// Dry-run mode (print the plan without running `security`)
    #[serde(default)]
    pub dry_run: bool,

    /// Verbose output
    #[serde(default)]
    pub verbose: bool,
}

/// One certificate/private key pair to import.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CertificateConfig {
    pub public_key: PathBuf,
    pub private_key: PathBuf,
}

impl BootstrapConfig {
    /// Read and resolve a TOML config file.
    ///
    /// `~` is expanded in every path, and relative certificate and keychain
    /// paths are resolved against the directory containing the file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let base_dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Self::from_toml(&content, base_dir)
    }

    /// Parse and resolve a TOML document, resolving relative paths against `base_dir`.
    pub fn from_toml(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.validate()?;
        config.resolve_paths(base_dir)?;
        Ok(config)
    }

    /// Certificates to import, in file order.
    #[must_use]
    pub fn certificate_pairs(&self) -> Vec<Certificate> {
        self.certificates
            .iter()
            .map(|entry| Certificate::new(&entry.public_key, &entry.private_key))
            .collect()
    }

    /// Replace the configured `security` executable when one was given explicitly.
    pub fn override_security_path(&mut self, security_path: Option<&str>) {
        if let Some(security_path) = security_path {
            self.security_path = security_path.to_string();
        }
    }

    /// Resolve the keychain password from the process environment.
    pub fn password(&self) -> Result<Zeroizing<String>> {
        self.password_with(|name| std::env::var(name).ok())
    }

    /// Resolve the keychain password using `lookup` for environment variables.
    ///
    /// Order: literal `keychain_password`, then the variable named by
    /// `keychain_password_env`, then an empty password. A named variable that
    /// is unset is an error rather than a silent empty password.
    pub fn password_with<F>(&self, lookup: F) -> Result<Zeroizing<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = &self.keychain_password {
            return Ok(Zeroizing::new(password.clone()));
        }

        match &self.keychain_password_env {
            Some(name) => lookup(name).map(Zeroizing::new).ok_or_else(|| {
                TrustError::MissingConfig(format!(
                    "Keychain password environment variable {name} is not set"
                ))
            }),
            None => Ok(Zeroizing::new(String::new())),
        }
    }

    fn resolve_paths(&mut self, base_dir: &Path) -> Result<()> {
        self.keychain_path = resolve_path(&self.keychain_path, base_dir)?;
        for entry in &mut self.certificates {
            entry.public_key = resolve_path(&entry.public_key, base_dir)?;
            entry.private_key = resolve_path(&entry.private_key, base_dir)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.keychain_path.as_os_str().is_empty() {
            return Err(TrustError::InvalidConfig(
                "keychain_path must not be empty".to_string(),
            ));
        }

        if self.security_path.trim().is_empty() {
            return Err(TrustError::InvalidConfig(
                "security_path must not be empty".to_string(),
            ));
        }

        if self.keychain_password.is_some() && self.keychain_password_env.is_some() {
            return Err(TrustError::InvalidConfig(
                "Set either keychain_password or keychain_password_env, not both".to_string(),
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("keychain_path", &self.keychain_path)
            .field(
                "keychain_password",
                &self.keychain_password.as_ref().map(|_| "<redacted>"),
            )
            .field("keychain_password_env", &self.keychain_password_env)
            .field("security_path", &self.security_path)
            .field("lock_after_import", &self.lock_after_import)
            .field("certificates", &self.certificates)
            .field("dry_run", &self.dry_run)
            .field("verbose", &self.verbose)
            .finish()
    }
}

fn resolve_path(path: &Path, base_dir: &Path) -> Result<PathBuf> {
    let raw = path
        .to_str()
        .ok_or_else(|| TrustError::InvalidConfig(format!("Invalid path: {}", path.display())))?;
    let expanded = PathBuf::from(expand_tilde_path(raw)?);

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base_dir.join(expanded))
    }
}

fn default_security_path() -> String {
    DEFAULT_SECURITY_PATH.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
keychain_path = "/tmp/ci.keychain-db"
"#;

    #[test]
    fn defaults_apply() {
        let config = BootstrapConfig::from_toml(MINIMAL, Path::new("/work")).unwrap();

        assert_eq!(config.keychain_path, PathBuf::from("/tmp/ci.keychain-db"));
        assert_eq!(config.security_path, "/usr/bin/security");
        assert!(!config.lock_after_import);
        assert!(!config.dry_run);
        assert!(!config.verbose);
        assert!(config.certificates.is_empty());
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let content = r#"
keychain_path = "build/ci.keychain-db"

[[certificates]]
public_key = "signing/dev.cer"
private_key = "/abs/dev.p12"
"#;
        let config = BootstrapConfig::from_toml(content, Path::new("/work")).unwrap();

        assert_eq!(config.keychain_path, PathBuf::from("/work/build/ci.keychain-db"));
        assert_eq!(
            config.certificate_pairs(),
            vec![Certificate::new("/work/signing/dev.cer", "/abs/dev.p12")]
        );
    }

    #[test]
    fn explicit_security_path_overrides_config_even_when_default() {
        let content = r#"
keychain_path = "/tmp/kc"
security_path = "/opt/custom/security"
"#;
        let mut config = BootstrapConfig::from_toml(content, Path::new("/")).unwrap();

        config.override_security_path(None);
        assert_eq!(config.security_path, "/opt/custom/security");

        config.override_security_path(Some(DEFAULT_SECURITY_PATH));
        assert_eq!(config.security_path, "/usr/bin/security");
    }

    #[test]
    fn literal_password_wins() {
        let content = r#"
keychain_path = "/tmp/kc"
keychain_password = "hunter2"
"#;
        let config = BootstrapConfig::from_toml(content, Path::new("/")).unwrap();

        let password = config.password_with(|_| Some("from-env".to_string())).unwrap();
        assert_eq!(password.as_str(), "hunter2");
    }

    #[test]
    fn password_from_named_env_var() {
        let content = r#"
keychain_path = "/tmp/kc"
keychain_password_env = "CI_KEYCHAIN_PASSWORD"
"#;
        let config = BootstrapConfig::from_toml(content, Path::new("/")).unwrap();

        let password = config
            .password_with(|name| (name == "CI_KEYCHAIN_PASSWORD").then(|| "s3cret".to_string()))
            .unwrap();
        assert_eq!(password.as_str(), "s3cret");

        let err = config.password_with(|_| None).unwrap_err();
        assert!(matches!(err, TrustError::MissingConfig(_)));
    }

    #[test]
    fn no_password_source_means_empty_password() {
        let config = BootstrapConfig::from_toml(MINIMAL, Path::new("/")).unwrap();
        assert_eq!(config.password_with(|_| None).unwrap().as_str(), "");
    }

    #[test]
    fn rejects_both_password_sources() {
        let content = r#"
keychain_path = "/tmp/kc"
keychain_password = "a"
keychain_password_env = "B"
"#;
        let err = BootstrapConfig::from_toml(content, Path::new("/")).unwrap_err();
        assert!(matches!(err, TrustError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_missing_keychain_path() {
        let err =
            BootstrapConfig::from_toml("lock_after_import = true", Path::new("/")).unwrap_err();
        assert!(matches!(err, TrustError::Toml(_)));
    }

    #[test]
    fn debug_output_redacts_password() {
        let content = r#"
keychain_path = "/tmp/kc"
keychain_password = "hunter2"
"#;
        let config = BootstrapConfig::from_toml(content, Path::new("/")).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn from_file_uses_file_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("trust.toml");
        tokio::fs::write(
            &config_path,
            r#"
keychain_path = "ci.keychain-db"

[[certificates]]
public_key = "dev.cer"
private_key = "dev.p12"
"#,
        )
        .await
        .unwrap();

        let config = BootstrapConfig::from_file(&config_path).await.unwrap();

        assert_eq!(config.keychain_path, dir.path().join("ci.keychain-db"));
        assert_eq!(config.certificates[0].public_key, dir.path().join("dev.cer"));
    }
}
