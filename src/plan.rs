// src/plan.rs

//! Turning validated config into ready-to-run execution requests.

use std::num::NonZeroUsize;

use crate::config::{ConfigFile, JobSpec, Settings};
use crate::errors::{JobrunError, Result};
use crate::exec::{ExecutionOptions, ExecutionRequest, RetryPolicy};

/// A job ready to be handed to the runner.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub name: String,
    pub request: ExecutionRequest,
    pub retry: RetryPolicy,
}

/// Everything a batch needs: the cap and the jobs in start order.
#[derive(Debug, Clone)]
pub struct Plan {
    pub concurrency: NonZeroUsize,
    pub jobs: Vec<PlannedJob>,
}

/// Overrides coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct PlanOverrides {
    pub concurrency: Option<NonZeroUsize>,
    /// Run only these jobs (file order is kept). Empty means all.
    pub only: Vec<String>,
    /// Force output suppression for every job.
    pub quiet: bool,
}

impl Plan {
    pub fn from_config(cfg: &ConfigFile, overrides: &PlanOverrides) -> Result<Self> {
        for name in overrides.only.iter() {
            if cfg.job(name).is_none() {
                return Err(JobrunError::JobNotFound(name.clone()));
            }
        }

        let jobs = cfg
            .jobs
            .iter()
            .filter(|job| overrides.only.is_empty() || overrides.only.contains(&job.name))
            .map(|job| plan_job(job, &cfg.settings, overrides.quiet))
            .collect();

        Ok(Self {
            concurrency: overrides.concurrency.unwrap_or(cfg.settings.concurrency),
            jobs,
        })
    }
}

fn plan_job(job: &JobSpec, settings: &Settings, quiet: bool) -> PlannedJob {
    let mut options = ExecutionOptions::new()
        .suppress_output(quiet || job.suppress_output)
        .kill_signal(job.kill_signal)
        .force_kill_after(Some(job.force_kill_after))
        .drain_window(settings.drain_window);

    if let Some(cwd) = &job.cwd {
        options = options.cwd(cwd);
    }
    if let Some(timeout) = job.timeout {
        options = options.timeout(timeout);
    }
    for (key, value) in job.env.iter() {
        options = options.env(key, value);
    }

    PlannedJob {
        name: job.name.clone(),
        request: ExecutionRequest::new(&job.exe, &job.args).with_options(options),
        retry: job.retry,
    }
}
