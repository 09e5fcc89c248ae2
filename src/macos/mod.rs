//! macOS keychain trust bootstrap
//!
//! # Module Organization
//!
//! - `output` - Logging seam and colored output macros
//! - `validation` - Path expansion and dependency checks
//! - `keychain` - Certificate and keychain operations over `security`
//! - `setup` - Bootstrap workflow driven by a config file
//!
//! # Error Handling Strategy
//!
//! **CRITICAL I/O** - Errors propagated with `?` operator:
//!   • External commands: every `security` invocation
//!   • File operations: config reads, lock file, keychain directory
//!
//! **DECORATIVE I/O** - Errors ignored with `let _ =`:
//!   • Terminal coloring: `buffer.set_color()`, writeln!(), `bufwtr.print()`
//!
//! Diagnostics from `security` are carried to the caller verbatim.

#[macro_use]
pub mod output;

pub mod keychain;
pub mod setup;
pub mod validation;

// Re-export public API
pub use keychain::{ArtifactKind, Certificate, SecurityController, is_already_exists_diagnostic};
pub use output::{Level, Reporter, TerminalReporter};
pub use setup::{BootstrapLock, bootstrap, plan, setup_from_config, show_config};
