// src/exec/retry.rs

//! "Try N times with backoff" around a single execution.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use super::executor::{execute_request, wait_for_cancel};
use super::options::ExecutionRequest;
use super::outcome::{ExecutionError, ExecutionErrorKind, ExecutionResult};

/// How often to run a failing command, and how long to wait in between.
///
/// The delay doubles after every failed attempt, starting at `backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

impl RetryPolicy {
    pub fn once() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    /// Delay before attempt `failed + 1`, after `failed` failures.
    pub fn delay_after(&self, failed: u32) -> Duration {
        let factor = 1u32
            .checked_shl(failed.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

/// Run `request` until it succeeds or the policy is exhausted.
///
/// Not retried, whatever the policy says:
/// - spawn failures (the executable will not appear between attempts),
/// - runs stopped through a `ChildController` or the options' cancellation
///   token (someone asked us to stop).
///
/// Timeouts are retried. Cancelling the token during the backoff returns the
/// last failure at once, without another attempt.
pub async fn execute_with_retry(
    request: &ExecutionRequest,
    policy: RetryPolicy,
) -> Result<ExecutionResult, ExecutionError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        let err = match execute_request(request).await {
            Ok(result) => {
                if attempt > 1 {
                    info!(exe = %request.exe, attempt, "command succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) => err,
        };

        let stopped = err.result.killed && !err.result.timed_out;
        let final_kind = matches!(
            err.kind,
            ExecutionErrorKind::SpawnFailed | ExecutionErrorKind::Cancelled
        );
        if final_kind || stopped || attempt >= attempts || request.options.is_cancelled() {
            return Err(err);
        }

        let delay = policy.delay_after(attempt);
        warn!(
            exe = %request.exe,
            attempt,
            attempts,
            ?delay,
            error = %err,
            "command failed; retrying"
        );
        tokio::select! {
            _ = wait_for_cancel(request.options.cancel.as_ref()) => {
                info!(exe = %request.exe, attempt, "retry cancelled during backoff");
                return Err(err);
            }
            _ = sleep(delay) => {}
        }
        attempt += 1;
    }
}
