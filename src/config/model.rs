// src/config/model.rs

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::RetryPolicy;
use crate::types::KillSignal;

/// Raw configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// concurrency = 4
/// drain_window = "100ms"
///
/// [[job]]
/// name = "build"
/// cmd = "dotnet build \"My App.sln\""
/// timeout = "10m"
///
/// [[job]]
/// name = "test"
/// cmd = "dotnet test"
/// args = ["--no-build"]
/// retries = 1
/// ```
///
/// Jobs are an array of tables so the file order is the start order.
/// Unknown keys are rejected rather than silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All jobs from `[[job]]`, in file order.
    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Maximum jobs in flight. Defaults to the number of CPUs.
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Duration string; time allowed for stdio to drain after a process
    /// exits or is killed.
    #[serde(default)]
    pub drain_window: Option<String>,

    /// Default for jobs that do not set `suppress_output`.
    #[serde(default)]
    pub suppress_output: bool,

    /// Default escalation delay for jobs that do not set their own.
    #[serde(default)]
    pub force_kill_after: Option<String>,
}

/// One `[[job]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Unique job name, used in logs and for `--job` selection.
    pub name: String,

    /// Command line; split into executable + arguments, honouring quotes.
    pub cmd: String,

    /// Extra arguments appended verbatim after those from `cmd`.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory, relative to the config file's directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Duration string, e.g. `"30s"`.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub kill_signal: Option<KillSignal>,

    #[serde(default)]
    pub force_kill_after: Option<String>,

    #[serde(default)]
    pub suppress_output: Option<bool>,

    /// Extra attempts after the first failure.
    #[serde(default)]
    pub retries: u32,

    /// Initial delay between attempts; doubles each time.
    #[serde(default)]
    pub retry_backoff: Option<String>,
}

/// Validated global settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub concurrency: NonZeroUsize,
    pub drain_window: Duration,
    pub suppress_output: bool,
}

/// Validated job with every duration parsed and the command split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub exe: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    pub kill_signal: KillSignal,
    pub force_kill_after: Duration,
    pub suppress_output: bool,
    pub retry: RetryPolicy,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (see `validate.rs`) or the loader.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: Settings,
    pub jobs: Vec<JobSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(settings: Settings, jobs: Vec<JobSpec>) -> Self {
        Self { settings, jobs }
    }

    pub fn job(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.iter().find(|job| job.name == name)
    }

    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.jobs.iter().map(|job| job.name.as_str())
    }
}
