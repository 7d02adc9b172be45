// src/exec/outcome.rs

//! Result and error shapes produced by [`crate::exec::execute`].

use std::time::Duration;

use thiserror::Error;

use super::options::display_command;
use crate::errors::JobrunError;

/// Everything known about a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exe: String,
    pub args: Vec<String>,
    /// `None` when the process was ended by a signal (or never started).
    pub exit_code: Option<i32>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub elapsed: Duration,
    pub timed_out: bool,
    /// Terminated by us, through the timeout or a `ChildController`.
    pub killed: bool,
}

impl ExecutionResult {
    pub(crate) fn empty(exe: &str, args: &[String], elapsed: Duration) -> Self {
        Self {
            exe: exe.to_string(),
            args: args.to_vec(),
            exit_code: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            elapsed,
            timed_out: false,
            killed: false,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn command_line(&self) -> String {
        display_command(&self.exe, &self.args)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorKind {
    /// The process could not be created (e.g. executable not found).
    SpawnFailed,
    /// The process ran and exited with a non-zero code.
    NonZeroExit,
    /// The process ended without an exit code (signal).
    Terminated,
    /// Waiting on the child failed after it was spawned.
    Io,
    /// Cancelled before a process was started.
    Cancelled,
}

/// Failed execution. Carries the same data as a successful result so that
/// callers can report captured output without running the command again.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
    pub result: ExecutionResult,
    #[source]
    pub source: Option<std::io::Error>,
}

impl ExecutionError {
    pub(crate) fn spawn_failed(
        exe: &str,
        args: &[String],
        elapsed: Duration,
        err: std::io::Error,
    ) -> Self {
        Self {
            kind: ExecutionErrorKind::SpawnFailed,
            message: format!("failed to start `{}`: {err}", exe),
            result: ExecutionResult::empty(exe, args, elapsed),
            source: Some(err),
        }
    }

    pub(crate) fn cancelled(exe: &str, args: &[String]) -> Self {
        let mut result = ExecutionResult::empty(exe, args, Duration::ZERO);
        result.killed = true;
        Self {
            kind: ExecutionErrorKind::Cancelled,
            message: format!("`{}` was cancelled before it started", display_command(exe, args)),
            result,
            source: None,
        }
    }

    pub(crate) fn wait_failed(result: ExecutionResult, err: std::io::Error) -> Self {
        Self {
            kind: ExecutionErrorKind::Io,
            message: format!("lost track of `{}`: {err}", result.command_line()),
            result,
            source: Some(err),
        }
    }

    /// Build the error for a finished process that did not exit with 0.
    pub(crate) fn from_result(result: ExecutionResult) -> Self {
        let command = result.command_line();
        let (kind, mut message) = match result.exit_code {
            Some(code) => (
                ExecutionErrorKind::NonZeroExit,
                format!("`{command}` exited with code {code}"),
            ),
            None => (
                ExecutionErrorKind::Terminated,
                format!("`{command}` was terminated by a signal"),
            ),
        };
        if result.timed_out {
            message.push_str(&format!(" after timing out ({:?})", result.elapsed));
        } else if result.killed {
            message.push_str(" after a kill request");
        }

        Self {
            kind,
            message,
            result,
            source: None,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.result.exit_code
    }

    pub fn stdout(&self) -> &[String] {
        &self.result.stdout
    }

    pub fn stderr(&self) -> &[String] {
        &self.result.stderr
    }

    pub fn timed_out(&self) -> bool {
        self.result.timed_out
    }

    /// Find an `ExecutionError` anywhere in an `anyhow` error chain.
    pub fn find(err: &anyhow::Error) -> Option<&ExecutionError> {
        err.chain().find_map(|e| {
            // `JobrunError::Execution` is transparent, so its source skips the
            // wrapped error; look inside explicitly.
            e.downcast_ref::<ExecutionError>()
                .or_else(|| match e.downcast_ref::<JobrunError>() {
                    Some(JobrunError::Execution(inner)) => Some(inner),
                    _ => None,
                })
        })
    }
}

/// Branch on "did a command fail" without matching on concrete types.
pub fn is_execution_error(err: &anyhow::Error) -> bool {
    ExecutionError::find(err).is_some()
}
