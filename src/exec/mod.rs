// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs external commands with `tokio::process::Command` and reports a
//! structured [`ExecutionResult`] / [`ExecutionError`].
//!
//! - [`executor`] spawns one child, captures its output and enforces the
//!   timeout / kill model.
//! - [`options`] holds the request and option types, including line sinks
//!   and the spawn hook.
//! - [`controller`] is the kill handle given to spawn hooks.
//! - [`lines`] converts raw pipe bytes into lines.
//! - [`signal`] delivers signals to a child's process group.
//! - [`retry`] wraps an execution in a retry-with-backoff loop.
//! - [`cmdline`] splits a command string into an argument vector.
//! - [`registry`] tracks live children so a shutdown can stop them all.

pub mod cmdline;
pub mod controller;
pub mod executor;
pub mod lines;
pub mod options;
pub mod outcome;
pub mod registry;
pub mod retry;
mod signal;

pub use cmdline::{parse_command_line, split_command_line};
pub use controller::ChildController;
pub use executor::{execute, execute_request};
pub use lines::LineBuffer;
pub use options::{ExecutionOptions, ExecutionRequest, LineSink, SpawnHook};
pub use outcome::{ExecutionError, ExecutionErrorKind, ExecutionResult, is_execution_error};
pub use registry::ChildRegistry;
pub use retry::{RetryPolicy, execute_with_retry};
