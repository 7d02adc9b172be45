// src/exec/options.rs

//! Execution request and its options.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio_util::sync::CancellationToken;

use crate::errors::Result;
use crate::exec::cmdline::parse_command_line;
use crate::exec::controller::ChildController;
use crate::types::KillSignal;

/// Receives captured output one line at a time, as it arrives.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Called synchronously, exactly once, right after the child is spawned.
pub type SpawnHook = Arc<dyn Fn(&Child, &ChildController) + Send + Sync>;

pub const DEFAULT_DRAIN_WINDOW: Duration = Duration::from_millis(100);
pub const DEFAULT_FORCE_KILL_AFTER: Duration = Duration::from_secs(5);

/// Per-execution settings. Every field has a default; build with the
/// chainable setters.
#[derive(Clone)]
pub struct ExecutionOptions {
    /// Working directory; `None` inherits ours.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
    /// Stop the child once this much time has passed.
    pub timeout: Option<Duration>,
    /// Do not echo child output to our own stdout/stderr.
    pub suppress_output: bool,
    /// Explicit echo override. `None` echoes unless output is suppressed or
    /// a sink is installed for that stream.
    pub echo: Option<bool>,
    pub stdout: Option<LineSink>,
    pub stderr: Option<LineSink>,
    /// First signal sent on timeout or manual kill.
    pub kill_signal: KillSignal,
    /// Escalate to a forceful kill if the child survives `kill_signal` this
    /// long. `None` waits indefinitely.
    pub force_kill_after: Option<Duration>,
    /// How long to keep reading stdio after the child exited.
    pub drain_window: Duration,
    pub on_child_spawned: Option<SpawnHook>,
    /// Once cancelled, no new process is started and a running one is
    /// stopped like a `ChildController::kill`. Retries stop as well.
    pub cancel: Option<CancellationToken>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: Vec::new(),
            timeout: None,
            suppress_output: false,
            echo: None,
            stdout: None,
            stderr: None,
            kill_signal: KillSignal::default(),
            force_kill_after: Some(DEFAULT_FORCE_KILL_AFTER),
            drain_window: DEFAULT_DRAIN_WINDOW,
            on_child_spawned: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("cwd", &self.cwd)
            .field("env", &self.env)
            .field("timeout", &self.timeout)
            .field("suppress_output", &self.suppress_output)
            .field("echo", &self.echo)
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .field("kill_signal", &self.kill_signal)
            .field("force_kill_after", &self.force_kill_after)
            .field("drain_window", &self.drain_window)
            .field("on_child_spawned", &self.on_child_spawned.is_some())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn suppress_output(mut self, suppress: bool) -> Self {
        self.suppress_output = suppress;
        self
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = Some(echo);
        self
    }

    pub fn on_stdout(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.stdout = Some(Arc::new(sink));
        self
    }

    pub fn on_stderr(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.stderr = Some(Arc::new(sink));
        self
    }

    pub fn kill_signal(mut self, signal: KillSignal) -> Self {
        self.kill_signal = signal;
        self
    }

    pub fn force_kill_after(mut self, grace: Option<Duration>) -> Self {
        self.force_kill_after = grace;
        self
    }

    pub fn drain_window(mut self, window: Duration) -> Self {
        self.drain_window = window;
        self
    }

    pub fn on_child_spawned(
        mut self,
        hook: impl Fn(&Child, &ChildController) + Send + Sync + 'static,
    ) -> Self {
        self.on_child_spawned = Some(Arc::new(hook));
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Whether lines of a stream with the given sink are echoed.
    pub(crate) fn echo_enabled(&self, sink: Option<&LineSink>) -> bool {
        self.echo
            .unwrap_or(!self.suppress_output && sink.is_none())
    }
}

/// One command to run: executable, argument vector and options.
///
/// Arguments are handed to the OS untouched; nothing here adds or strips
/// quotes.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub exe: String,
    pub args: Vec<String>,
    pub options: ExecutionOptions,
}

impl ExecutionRequest {
    pub fn new<I, S>(exe: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exe: exe.into(),
            args: args.into_iter().map(Into::into).collect(),
            options: ExecutionOptions::default(),
        }
    }

    /// Build a request from a single command string such as
    /// `dotnet test "My Tests.csproj"`.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let (exe, args) = parse_command_line(line)?;
        Ok(Self::new(exe, args))
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// `exe arg1 arg2`, for logs and error messages.
    pub fn display(&self) -> String {
        display_command(&self.exe, &self.args)
    }
}

pub(crate) fn display_command(exe: &str, args: &[String]) -> String {
    let mut out = exe.to_string();
    for arg in args {
        out.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            out.push('"');
            out.push_str(arg);
            out.push('"');
        } else {
            out.push_str(arg);
        }
    }
    out
}
