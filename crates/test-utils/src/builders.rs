#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use jobrun::config::{ConfigFile, ConfigSection, JobConfig, RawConfigFile};
use jobrun::types::KillSignal;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                job: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.config.job.push(job);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.config.concurrency = Some(n);
        self
    }

    pub fn drain_window(mut self, window: &str) -> Self {
        self.config.config.drain_window = Some(window.to_string());
        self
    }

    pub fn suppress_output(mut self, val: bool) -> Self {
        self.config.config.suppress_output = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            job: JobConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                args: vec![],
                cwd: None,
                env: BTreeMap::new(),
                timeout: None,
                kill_signal: None,
                force_kill_after: None,
                suppress_output: None,
                retries: 0,
                retry_backoff: None,
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.job.args.push(arg.to_string());
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.job.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.job.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.job.timeout = Some(duration.to_string());
        self
    }

    pub fn kill_signal(mut self, signal: KillSignal) -> Self {
        self.job.kill_signal = Some(signal);
        self
    }

    pub fn force_kill_after(mut self, duration: &str) -> Self {
        self.job.force_kill_after = Some(duration.to_string());
        self
    }

    pub fn suppress_output(mut self, val: bool) -> Self {
        self.job.suppress_output = Some(val);
        self
    }

    pub fn retries(mut self, n: u32) -> Self {
        self.job.retries = n;
        self
    }

    pub fn retry_backoff(mut self, duration: &str) -> Self {
        self.job.retry_backoff = Some(duration.to_string());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
