// src/exec/executor.rs

//! Single process execution: spawn, capture, time out, kill, report.
//!
//! Lifecycle of one call:
//!
//! ```text
//! NotStarted --spawn ok--> Running --exit--------------> Completed
//!     |                       |---timeout / kill()-----> Killed
//!     '--spawn error--> FailedToStart
//! ```
//!
//! stdout and stderr are read by two background tasks that split the bytes
//! into lines (see [`LineBuffer`]). Every line is captured, and is also
//! delivered to the stream's sink and echoed when that is enabled. Once the
//! child is gone the readers get `drain_window` to finish; anything still
//! holding the pipes open after that (a grandchild that escaped the process
//! group, for instance) is abandoned so the call always returns.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::controller::ChildController;
use super::lines::LineBuffer;
use super::options::{ExecutionOptions, ExecutionRequest, LineSink};
use super::outcome::{ExecutionError, ExecutionResult};
use super::signal;

const READ_CHUNK: usize = 8 * 1024;

/// Run `exe` with `args` once and wait for it to finish.
///
/// Returns `Ok` only for exit code 0. Spawn failures, non-zero exits and
/// signal deaths are all reported as [`ExecutionError`], which carries the
/// captured output.
pub async fn execute<I, S>(
    exe: impl Into<String>,
    args: I,
    options: ExecutionOptions,
) -> Result<ExecutionResult, ExecutionError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let request = ExecutionRequest::new(exe, args).with_options(options);
    execute_request(&request).await
}

/// Same as [`execute`], for a prepared request.
pub async fn execute_request(
    request: &ExecutionRequest,
) -> Result<ExecutionResult, ExecutionError> {
    let ExecutionRequest { exe, args, options } = request;
    let started = Instant::now();

    info!(
        exe = %exe,
        ?args,
        cwd = ?options.cwd,
        timeout = ?options.timeout,
        "starting process"
    );

    if options.is_cancelled() {
        info!(exe = %exe, "cancelled before start; not spawning");
        return Err(ExecutionError::cancelled(exe, args));
    }

    let mut child = match build_command(exe, args, options).spawn() {
        Ok(child) => child,
        Err(err) => {
            warn!(exe = %exe, error = %err, "failed to spawn process");
            return Err(ExecutionError::spawn_failed(
                exe,
                args,
                started.elapsed(),
                err,
            ));
        }
    };

    let controller = ChildController::new(child.id());
    if let Some(hook) = &options.on_child_spawned {
        hook(&child, &controller);
    }

    let stdout = child.stdout.take().map(|pipe| {
        let sink = options.stdout.clone();
        let echo = options.echo_enabled(sink.as_ref());
        StreamCapture::spawn(pipe, Stream::Stdout, sink, echo)
    });
    let stderr = child.stderr.take().map(|pipe| {
        let sink = options.stderr.clone();
        let echo = options.echo_enabled(sink.as_ref());
        StreamCapture::spawn(pipe, Stream::Stderr, sink, echo)
    });

    let supervised = supervise(&mut child, &controller, options).await;

    let (stdout, stderr) = tokio::join!(
        StreamCapture::collect(stdout, options.drain_window),
        StreamCapture::collect(stderr, options.drain_window),
    );

    let mut result = ExecutionResult {
        exe: exe.clone(),
        args: args.clone(),
        exit_code: None,
        stdout,
        stderr,
        elapsed: started.elapsed(),
        timed_out: false,
        killed: false,
    };

    let supervised = match supervised {
        Ok(supervised) => supervised,
        Err(err) => {
            warn!(exe = %exe, error = %err, "waiting for process failed");
            result.killed = controller.is_killed();
            return Err(ExecutionError::wait_failed(result, err));
        }
    };
    result.exit_code = supervised.status.code();
    result.timed_out = supervised.timed_out;
    result.killed = supervised.killed;

    if result.success() {
        info!(
            exe = %exe,
            exit_code = 0,
            elapsed_ms = result.elapsed.as_millis() as u64,
            timed_out = result.timed_out,
            "process exited"
        );
        Ok(result)
    } else {
        warn!(
            exe = %exe,
            exit_code = ?result.exit_code,
            elapsed_ms = result.elapsed.as_millis() as u64,
            timed_out = result.timed_out,
            killed = result.killed,
            stdout_lines = result.stdout.len(),
            stderr_lines = result.stderr.len(),
            "process failed"
        );
        Err(ExecutionError::from_result(result))
    }
}

fn build_command(exe: &str, args: &[String], options: &ExecutionOptions) -> Command {
    let mut cmd = Command::new(exe);
    cmd.args(args)
        .envs(options.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    // Own process group, so a kill reaches everything the command started.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}

struct Supervised {
    status: ExitStatus,
    timed_out: bool,
    /// Whether we stopped the child. Decided when supervision ends, so a
    /// kill request arriving after a natural exit does not count.
    killed: bool,
}

/// Wait for the child, stopping it on timeout, on a controller request or
/// when the options' cancellation token fires.
async fn supervise(
    child: &mut Child,
    controller: &ChildController,
    options: &ExecutionOptions,
) -> io::Result<Supervised> {
    let deadline = options.timeout.map(|t| Instant::now() + t);

    let timed_out = tokio::select! {
        status = child.wait() => {
            return Ok(Supervised { status: status?, timed_out: false, killed: false });
        }
        _ = wait_for_deadline(deadline) => {
            warn!(
                pid = ?controller.pid(),
                timeout = ?options.timeout,
                signal = %options.kill_signal,
                "process timed out; terminating"
            );
            controller.mark_killed();
            true
        }
        _ = controller.kill_requested() => {
            info!(
                pid = ?controller.pid(),
                signal = %options.kill_signal,
                "kill requested; terminating process"
            );
            false
        }
        _ = wait_for_cancel(options.cancel.as_ref()) => {
            info!(
                pid = ?controller.pid(),
                signal = %options.kill_signal,
                "execution cancelled; terminating process"
            );
            controller.mark_killed();
            false
        }
    };

    if let Err(err) = signal::send_signal(child, options.kill_signal) {
        warn!(
            pid = ?controller.pid(),
            signal = %options.kill_signal,
            error = %err,
            "failed to signal process group; forcing kill"
        );
        signal::force_kill(child)?;
    }

    let status = match options.force_kill_after {
        Some(grace) if !options.kill_signal.is_forceful() => {
            match timeout(grace, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!(
                        pid = ?controller.pid(),
                        ?grace,
                        signal = %options.kill_signal,
                        "process ignored kill signal; forcing kill"
                    );
                    signal::force_kill(child)?;
                    child.wait().await?
                }
            }
        }
        _ => child.wait().await?,
    };

    Ok(Supervised {
        status,
        timed_out,
        killed: true,
    })
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Resolves once `token` is cancelled; never without a token.
pub(crate) async fn wait_for_cancel(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }

    /// Our own stream of the same kind. Async writers keep a slow terminal
    /// from blocking a runtime worker.
    fn echo_target(self) -> EchoWriter {
        match self {
            Stream::Stdout => Box::new(tokio::io::stdout()),
            Stream::Stderr => Box::new(tokio::io::stderr()),
        }
    }
}

type Captured = Arc<Mutex<Vec<String>>>;
type EchoWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Background reader for one child pipe.
struct StreamCapture {
    stream: Stream,
    lines: Captured,
    reader: JoinHandle<()>,
}

impl StreamCapture {
    fn spawn<R>(pipe: R, stream: Stream, sink: Option<LineSink>, echo: bool) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let lines = Captured::default();
        let reader = tokio::spawn(read_lines(pipe, stream, sink, echo, Arc::clone(&lines)));
        Self {
            stream,
            lines,
            reader,
        }
    }

    /// Give the reader `window` to hit EOF, then take what was captured.
    async fn collect(capture: Option<Self>, window: Duration) -> Vec<String> {
        let Some(mut capture) = capture else {
            return Vec::new();
        };

        match timeout(window, &mut capture.reader).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(stream = capture.stream.as_str(), error = %err, "output reader failed");
            }
            Err(_) => {
                debug!(
                    stream = capture.stream.as_str(),
                    ?window,
                    "pipe still open after drain window; abandoning reader"
                );
                capture.reader.abort();
            }
        }

        let mut lines = capture.lines.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *lines)
    }
}

async fn read_lines<R>(
    mut pipe: R,
    stream: Stream,
    sink: Option<LineSink>,
    echo: bool,
    captured: Captured,
) where
    R: AsyncRead + Unpin,
{
    let mut buffer = LineBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut echo = echo.then(|| stream.echo_target());

    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                for line in buffer.push(&chunk[..n]) {
                    deliver(stream, line, sink.as_ref(), echo.as_mut(), &captured).await;
                }
            }
            Err(err) => {
                debug!(stream = stream.as_str(), error = %err, "reading child output failed");
                break;
            }
        }
    }

    if let Some(line) = buffer.finish() {
        deliver(stream, line, sink.as_ref(), echo.as_mut(), &captured).await;
    }
}

async fn deliver(
    stream: Stream,
    line: String,
    sink: Option<&LineSink>,
    echo: Option<&mut EchoWriter>,
    captured: &Captured,
) {
    trace!(stream = stream.as_str(), "{}", line);
    if let Some(out) = echo {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        // Write errors (closed pipe) are ignored; the line is still captured.
        if out.write_all(&bytes).await.is_ok() {
            let _ = out.flush().await;
        }
    }
    if let Some(sink) = sink {
        sink(&line);
    }
    captured
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(line);
}
