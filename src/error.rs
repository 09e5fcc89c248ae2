//! Error types for keychain trust bootstrap.

use std::path::PathBuf;
use thiserror::Error;

use crate::macos::keychain::ArtifactKind;

pub type Result<T> = std::result::Result<T, TrustError>;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("Failed to import {kind} at {}: {diagnostic}", .path.display())]
    Import {
        kind: ArtifactKind,
        path: PathBuf,
        diagnostic: String,
    },

    #[error("Failed to decode signed document: {0}")]
    Decode(String),

    #[error("Failed to create keychain: {0}")]
    KeychainCreate(String),

    #[error("Failed to unlock keychain: {0}")]
    KeychainUnlock(String),

    #[error("Failed to lock keychain: {0}")]
    KeychainLock(String),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
