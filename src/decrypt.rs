//! Entry point for decrypting a project's signing artifacts.
//!
//! The cipher itself lives elsewhere; this module resolves the user-supplied
//! location and hands it to whatever [`SigningCipher`] the caller provides.

use crate::error::Result;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Decrypts the encrypted signing artifacts found under a directory.
pub trait SigningCipher {
    fn decrypt_signing(
        &self,
        path: &Path,
        keep_files: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Forwards a decrypt request to a [`SigningCipher`].
#[derive(Debug, Clone)]
pub struct DecryptService<C> {
    signing_cipher: C,
}

impl<C: SigningCipher> DecryptService<C> {
    #[must_use]
    pub fn new(signing_cipher: C) -> Self {
        Self { signing_cipher }
    }

    /// Decrypt signing artifacts at `path`.
    ///
    /// Relative paths resolve against the current directory; no path means
    /// the current directory itself. Encrypted originals are not kept.
    pub async fn run(&self, path: Option<&str>) -> Result<()> {
        let path = resolve_path(path)?;
        self.signing_cipher.decrypt_signing(&path, false).await
    }
}

fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(std::path::absolute(path)?),
        None => Ok(std::env::current_dir()?),
    }
}
