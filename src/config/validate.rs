// src/config/validate.rs

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::config::model::{ConfigFile, ConfigSection, JobConfig, JobSpec, RawConfigFile, Settings};
use crate::errors::{JobrunError, Result};
use crate::exec::RetryPolicy;
use crate::exec::options::{DEFAULT_DRAIN_WINDOW, DEFAULT_FORCE_KILL_AFTER};
use crate::exec::parse_command_line;
use crate::types::parse_duration;

/// Upper bound on `retries`, to catch typos like `retries = 100`.
pub const MAX_RETRIES: u32 = 10;

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::JobrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        let settings = resolve_settings(&raw.config)?;
        let default_force_kill = match &raw.config.force_kill_after {
            Some(s) => duration_field("[config].force_kill_after", s)?,
            None => DEFAULT_FORCE_KILL_AFTER,
        };
        let jobs = raw
            .job
            .iter()
            .map(|job| resolve_job(job, &raw.config, default_force_kill))
            .collect::<Result<Vec<_>>>()?;
        Ok(ConfigFile::new_unchecked(settings, jobs))
    }
}

/// Structural checks that do not need any parsing.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    validate_global_config(cfg)?;
    validate_job_names(cfg)?;
    Ok(())
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(JobrunError::ConfigError(
            "config must contain at least one [[job]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.concurrency == Some(0) {
        return Err(JobrunError::ConfigError(
            "[config].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for job in cfg.job.iter() {
        if job.name.trim().is_empty() {
            return Err(JobrunError::ConfigError(
                "every [[job]] needs a non-empty `name`".to_string(),
            ));
        }
        if !seen.insert(job.name.as_str()) {
            return Err(JobrunError::ConfigError(format!(
                "job name '{}' is used more than once",
                job.name
            )));
        }
        if job.retries > MAX_RETRIES {
            return Err(JobrunError::ConfigError(format!(
                "job '{}' has retries = {} (max {MAX_RETRIES})",
                job.name, job.retries
            )));
        }
    }
    Ok(())
}

fn resolve_settings(section: &ConfigSection) -> Result<Settings> {
    let concurrency = match section.concurrency {
        Some(n) => NonZeroUsize::new(n).ok_or_else(|| {
            JobrunError::ConfigError("[config].concurrency must be >= 1 (got 0)".to_string())
        })?,
        None => default_concurrency(),
    };
    let drain_window = match &section.drain_window {
        Some(s) => duration_field("[config].drain_window", s)?,
        None => DEFAULT_DRAIN_WINDOW,
    };

    Ok(Settings {
        concurrency,
        drain_window,
        suppress_output: section.suppress_output,
    })
}

fn resolve_job(job: &JobConfig, section: &ConfigSection, default_force_kill: Duration) -> Result<JobSpec> {
    let (exe, mut args) = parse_command_line(&job.cmd).map_err(|err| {
        JobrunError::ConfigError(format!("job '{}' has an invalid `cmd`: {err}", job.name))
    })?;
    args.extend(job.args.iter().cloned());

    let field = |key: &str| format!("job '{}' `{key}`", job.name);

    let timeout = job
        .timeout
        .as_deref()
        .map(|s| duration_field(&field("timeout"), s))
        .transpose()?;
    let force_kill_after = match &job.force_kill_after {
        Some(s) => duration_field(&field("force_kill_after"), s)?,
        None => default_force_kill,
    };
    let backoff = match &job.retry_backoff {
        Some(s) => duration_field(&field("retry_backoff"), s)?,
        None => DEFAULT_RETRY_BACKOFF,
    };

    Ok(JobSpec {
        name: job.name.clone(),
        exe,
        args,
        cwd: job.cwd.clone(),
        env: job.env.clone(),
        timeout,
        kill_signal: job.kill_signal.unwrap_or_default(),
        force_kill_after,
        suppress_output: job.suppress_output.unwrap_or(section.suppress_output),
        retry: RetryPolicy::new(job.retries + 1, backoff),
    })
}

fn duration_field(what: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|err| JobrunError::ConfigError(format!("{what}: {err}")))
}

/// One job per available CPU, or one if that cannot be determined.
pub fn default_concurrency() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
