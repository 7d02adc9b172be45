// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod plan;
pub mod runner;
pub mod types;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::errors::JobrunError;
use crate::exec::{ChildRegistry, ExecutionErrorKind, ExecutionResult, execute_with_retry};
use crate::plan::{Plan, PlanOverrides, PlannedJob};
use crate::runner::{BatchError, Job, JobError, run_in_parallel};

/// Shared state for one batch: live children and the shutdown token.
///
/// Passed explicitly to every job; nothing here is process-global.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub registry: ChildRegistry,
    shutdown: CancellationToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop starting new jobs and attempts, and kill every running child.
    /// Returns how many registered children were signalled.
    pub fn shutdown(&self) -> usize {
        self.shutdown.cancel();
        self.registry.kill_all()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Token that fires on [`Self::shutdown`].
    pub fn token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - one runner job per configured command
/// - the bounded job runner
/// - Ctrl-C handling
/// - failure reporting
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading job file {}", args.config.display()))?;

    let overrides = PlanOverrides {
        concurrency: args.concurrency,
        only: args.jobs.clone(),
        quiet: args.quiet,
    };
    let plan = Plan::from_config(&cfg, &overrides)?;

    if args.dry_run {
        print_dry_run(&plan);
        return Ok(());
    }

    let ctx = RunContext::new();

    // Ctrl-C -> kill running children; queued jobs will refuse to start.
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let killed = ctx.shutdown();
            info!(killed, "shutdown requested");
        });
    }

    info!(
        jobs = plan.jobs.len(),
        concurrency = plan.concurrency.get(),
        "running jobs"
    );

    let total = plan.jobs.len();
    let jobs = plan
        .jobs
        .into_iter()
        .map(|planned| build_job(planned, ctx.clone()));

    match run_in_parallel(plan.concurrency, jobs).await {
        Ok(results) => {
            info!(jobs = results.len(), "all jobs succeeded");
            Ok(())
        }
        Err(batch) => {
            report_failures(&batch);
            Err(JobrunError::BatchFailed {
                failed: batch.failed(),
                total,
            }
            .into())
        }
    }
}

/// Wrap a planned job so that it registers its child for shutdown and stops
/// on a shutdown request, whether that arrives before the job starts, while a
/// child runs, or between retry attempts.
pub fn build_job(planned: PlannedJob, ctx: RunContext) -> Job<ExecutionResult, JobrunError> {
    let PlannedJob {
        name,
        mut request,
        retry,
    } = planned;
    let job_name = name.clone();

    Job::new(name, move || async move {
        if ctx.is_shutting_down() {
            return Err(JobrunError::Cancelled(job_name));
        }

        let hook_ctx = ctx.clone();
        let hook_name = job_name.clone();
        let user_hook = request.options.on_child_spawned.take();
        request.options = request
            .options
            .cancel_on(ctx.token())
            .on_child_spawned(move |child, controller| {
                hook_ctx.registry.register(&hook_name, controller);
                // Register first: a shutdown after this point reaches the
                // child through the registry, one before it is seen here.
                if hook_ctx.is_shutting_down() {
                    controller.kill();
                }
                if let Some(hook) = &user_hook {
                    hook(child, controller);
                }
            });

        let outcome = execute_with_retry(&request, retry).await;
        ctx.registry.unregister(&job_name);
        debug!(job = %job_name, ok = outcome.is_ok(), "job settled");
        outcome.map_err(|err| match err.kind {
            ExecutionErrorKind::Cancelled => JobrunError::Cancelled(job_name),
            _ => JobrunError::from(err),
        })
    })
}

/// Re-emit what failed jobs printed, so it is visible even with `--quiet`.
fn report_failures(batch: &BatchError<JobrunError>) {
    for failure in batch.failures.iter() {
        error!(job = %failure.name, error = %failure.error, "job failed");

        let Some(JobrunError::Execution(err)) = failure.error.as_failed() else {
            continue;
        };
        if err.stdout().is_empty() && err.stderr().is_empty() {
            continue;
        }
        eprintln!("---- {} ({}) ----", failure.name, err.result.command_line());
        for line in err.stdout() {
            eprintln!("{line}");
        }
        for line in err.stderr() {
            eprintln!("{line}");
        }
    }

    if let Some(first) = batch.first() {
        if let JobError::Panicked(msg) = &first.error {
            error!(job = %first.name, panic = %msg, "first failure was a panic");
        }
    }
}

/// Simple dry-run output: print the cap and each job's argv.
fn print_dry_run(plan: &Plan) {
    println!("jobrun dry-run");
    println!("  concurrency = {}", plan.concurrency);
    println!();

    println!("jobs ({}):", plan.jobs.len());
    for job in plan.jobs.iter() {
        let options = &job.request.options;
        println!("  - {}", job.name);
        println!("      cmd: {}", job.request.display());
        if let Some(ref cwd) = options.cwd {
            println!("      cwd: {}", cwd.display());
        }
        if let Some(timeout) = options.timeout {
            println!("      timeout: {timeout:?} ({})", options.kill_signal);
        }
        if job.retry.attempts > 1 {
            println!("      attempts: {}", job.retry.attempts);
        }
        if options.suppress_output {
            println!("      suppress_output: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
