//! Certificate and keychain operations for macOS
//!
//! This module provides functionality for:
//! - Decoding CMS-signed documents such as provisioning profiles
//! - Importing certificates and private keys, skipping ones already present
//! - Creating, unlocking and locking keychain files

mod certificate;
mod controller;
mod diagnostics;

// Re-export public APIs
pub use certificate::{ArtifactKind, Certificate};
pub use controller::{DEFAULT_SECURITY_PATH, SecurityController};
pub use diagnostics::is_already_exists_diagnostic;
