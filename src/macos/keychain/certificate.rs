//! Signing certificate pairs as they live on disk

use std::fmt;
use std::path::{Path, PathBuf};

/// A certificate file and its paired private key file.
///
/// Two certificates with the same paths are the same certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    public_key_path: PathBuf,
    private_key_path: PathBuf,
}

impl Certificate {
    #[must_use]
    pub fn new(public_key_path: impl Into<PathBuf>, private_key_path: impl Into<PathBuf>) -> Self {
        Self {
            public_key_path: public_key_path.into(),
            private_key_path: private_key_path.into(),
        }
    }

    #[must_use]
    pub fn public_key_path(&self) -> &Path {
        &self.public_key_path
    }

    #[must_use]
    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }
}

/// Which half of a [`Certificate`] an operation was dealing with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Certificate,
    PrivateKey,
}

impl ArtifactKind {
    /// `security` subcommand that probes for this artifact.
    #[must_use]
    pub fn probe_subcommand(self) -> &'static str {
        match self {
            Self::Certificate => "find-certificate",
            Self::PrivateKey => "find-key",
        }
    }

    /// Noun used in "Imported ... at <path>" records.
    #[must_use]
    pub fn imported_label(self) -> &'static str {
        match self {
            Self::Certificate => "certificate",
            Self::PrivateKey => "certificate private key",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Certificate => f.write_str("certificate"),
            Self::PrivateKey => f.write_str("private key"),
        }
    }
}
