//! Interpretation of free-text `security` diagnostics
//!
//! `security create-keychain` has no structured way to say the keychain is
//! already there; it only prints a message and exits non-zero. The match is
//! kept here, in one place, so it can be tested on its own.

const ALREADY_EXISTS: &str = "already exists";

/// True when a `security` diagnostic reports that the target already exists.
#[must_use]
pub fn is_already_exists_diagnostic(text: &str) -> bool {
    text.contains(ALREADY_EXISTS)
}
