//! Recording doubles for the process and logging seams
//!
//! Used by this crate's own tests and by downstream crates that drive a
//! [`SecurityController`](crate::SecurityController) without spawning `security`.

use crate::error::{Result, TrustError};
use crate::macos::output::{Level, Reporter};
use crate::process::{CommandOutcome, CommandRunner};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// [`CommandRunner`] that answers from a table of stubbed commands.
///
/// Commands are matched on the full argument vector, executable included.
/// Running a command that was never stubbed is an error, so tests notice
/// unexpected invocations.
#[derive(Debug, Default)]
pub struct StubCommandRunner {
    stubs: Mutex<HashMap<Vec<String>, CommandOutcome>>,
    invocations: Mutex<Vec<Vec<String>>>,
}

impl StubCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stub `command` to exit zero and print `output`.
    pub fn succeed_command(&self, command: &[&str], output: &str) {
        self.stub(
            command,
            CommandOutcome::Success {
                stdout: output.to_string(),
            },
        );
    }

    /// Stub `command` to exit 1 and print `error` to stderr.
    pub fn error_command(&self, command: &[&str], error: &str) {
        self.stub(
            command,
            CommandOutcome::Failure {
                code: Some(1),
                diagnostic: error.to_string(),
            },
        );
    }

    pub fn stub(&self, command: &[&str], outcome: CommandOutcome) {
        self.stubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(to_key(command), outcome);
    }

    /// Every command run so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of runs whose first argument (after the executable) is `subcommand`.
    #[must_use]
    pub fn invocation_count(&self, subcommand: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|command| command.get(1).map(String::as_str) == Some(subcommand))
            .count()
    }

    #[must_use]
    pub fn was_called(&self, command: &[&str]) -> bool {
        let key = to_key(command);
        self.invocations().contains(&key)
    }

    fn respond(&self, program: &str, args: &[&str]) -> Result<CommandOutcome> {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(program.to_string());
        command.extend(args.iter().map(|arg| (*arg).to_string()));

        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());

        self.stubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&command)
            .cloned()
            .ok_or_else(|| {
                TrustError::CommandExecution(format!(
                    "No stub registered for `{}`",
                    command.join(" ")
                ))
            })
    }
}

impl CommandRunner for StubCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutcome> {
        self.respond(program, args)
    }
}

fn to_key(command: &[&str]) -> Vec<String> {
    command.iter().map(|part| (*part).to_string()).collect()
}

/// [`Reporter`] that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages recorded at exactly `level`, in order.
    #[must_use]
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(recorded, _)| *recorded == level)
            .map(|(_, message)| message)
            .collect()
    }

    /// True when `message` was recorded verbatim at `level`.
    #[must_use]
    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.records()
            .iter()
            .any(|(recorded, text)| *recorded == level && text == message)
    }
}

impl Reporter for MemoryReporter {
    fn log(&self, level: Level, message: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
