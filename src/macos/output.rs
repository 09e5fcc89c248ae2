//! Colored terminal output and the logging seam
//!
//! ERROR HANDLING STRATEGY FOR DECORATIVE I/O:
//! All termcolor operations use `let _ =` to deliberately ignore errors.
//! Colored output is decorative and non-essential. If stderr/stdout is unavailable
//! (broken pipe, no TTY, etc.), the program continues gracefully without colors.

use std::io::Write;
use termcolor::{BufferWriter, ColorChoice, ColorSpec, WriteColor};

/// Macro for printing errors with red color
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(
            termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Red)),
        );
        let _ = write!(&mut buffer, "❌ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Macro for printing success messages with green color
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        let bufwtr = termcolor::BufferWriter::stdout(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(
            termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Green)),
        );
        let _ = write!(&mut buffer, "✓ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Error,
}

/// Write-only sink for operation outcomes.
///
/// The keychain controller records every completed or skipped step here and
/// never reads anything back.
pub trait Reporter {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }
}

/// Reporter that prints to the terminal with termcolor.
///
/// Debug records are only printed in verbose mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Whether records at `level` reach the terminal.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        level != Level::Debug || self.verbose
    }
}

impl Reporter for TerminalReporter {
    fn log(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }

        match level {
            Level::Debug => {
                let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
                let mut buffer = bufwtr.buffer();
                let _ = buffer.set_color(ColorSpec::new().set_dimmed(true));
                let _ = writeln!(&mut buffer, "   {message}");
                let _ = buffer.reset();
                let _ = bufwtr.print(&buffer);
            }
            Level::Info => {
                crate::success!("{message}");
            }
            Level::Error => {
                crate::error!("{message}");
            }
        }
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn log(&self, level: Level, message: &str) {
        (**self).log(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_records_need_verbose() {
        let quiet = TerminalReporter::new(false);
        assert!(!quiet.enabled(Level::Debug));
        assert!(quiet.enabled(Level::Info));
        assert!(quiet.enabled(Level::Error));

        let verbose = TerminalReporter::new(true);
        assert!(verbose.enabled(Level::Debug));
        assert!(verbose.enabled(Level::Info));
    }

    #[test]
    fn default_reporter_is_quiet() {
        assert!(!TerminalReporter::default().enabled(Level::Debug));
    }
}
