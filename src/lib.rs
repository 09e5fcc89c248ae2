//! Idempotent keychain trust bootstrap for build machines
//!
//! Imports signing certificates and private keys into a macOS keychain and
//! manages the keychain's lock state by driving the `security` tool. Re-running
//! against an already configured machine skips what is already in place.

pub mod config;
pub mod decrypt;
pub mod error;

#[macro_use]
pub mod macos;

pub mod process;
pub mod testing;

// Re-export common types
pub use config::{BootstrapConfig, CertificateConfig};
pub use decrypt::{DecryptService, SigningCipher};
pub use error::TrustError;
pub use macos::{
    ArtifactKind, Certificate, Level, Reporter, SecurityController, TerminalReporter,
    is_already_exists_diagnostic,
};
pub use process::{CommandOutcome, CommandRunner, SystemCommandRunner};
