//! Path expansion and dependency checks

use crate::error::{Result, TrustError};
use std::path::Path;

/// Expand tilde in path, returning error if HOME is not set
///
/// This function wraps `shellexpand::tilde()` with proper error handling.
/// If the path starts with `~` and expansion fails (HOME not set), returns
/// a clear error message instructing the user to use absolute paths.
pub fn expand_tilde_path(path: &str) -> Result<String> {
    let expanded = shellexpand::tilde(path).to_string();

    // When HOME is unset, shellexpand leaves ~ unchanged
    if path.starts_with('~') && expanded.starts_with('~') {
        return Err(TrustError::InvalidConfig(
            "Could not expand ~ in path (HOME environment variable not set).\n\
             Please use absolute path instead.\n\
             Example: /Users/username/ci.keychain-db instead of ~/ci.keychain-db"
                .to_string(),
        ));
    }

    Ok(expanded)
}

/// Check that the `security` executable can be started
///
/// `security help` exits non-zero on some releases, so only a spawn failure
/// counts as missing.
pub async fn check_security_available(executable: &str) -> Result<()> {
    let check = tokio::process::Command::new(executable)
        .arg("help")
        .output()
        .await;

    if let Err(e) = check {
        return Err(TrustError::MissingDependency(format!(
            "'{executable}' could not be started: {e}\n\
             This tool requires macOS with the security framework."
        )));
    }

    Ok(())
}

/// Make sure the directory that will hold a keychain file exists
pub async fn ensure_keychain_parent(keychain_path: &Path) -> Result<()> {
    if let Some(parent) = keychain_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_are_untouched() {
        assert_eq!(expand_tilde_path("/tmp/kc").unwrap(), "/tmp/kc");
        assert_eq!(expand_tilde_path("relative/kc").unwrap(), "relative/kc");
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let expanded = expand_tilde_path("~/Library/Keychains/ci.keychain-db").unwrap();
        assert_eq!(
            Path::new(&expanded),
            home.join("Library/Keychains/ci.keychain-db")
        );
    }

    #[tokio::test]
    async fn missing_security_binary_is_reported() {
        let err = check_security_available("/nonexistent/security")
            .await
            .unwrap_err();
        assert!(matches!(err, TrustError::MissingDependency(_)));
    }

    #[tokio::test]
    async fn creates_keychain_parent_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let keychain = dir.path().join("nested/keychains/ci.keychain-db");

        ensure_keychain_parent(&keychain).await.unwrap();

        assert!(dir.path().join("nested/keychains").is_dir());
        assert!(!keychain.exists());
    }
}
