// src/cli.rs

//! CLI argument parsing using `clap`.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `jobrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobrun",
    version,
    about = "Run the commands of a job file in parallel, with a concurrency cap.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job file (TOML).
    ///
    /// Default: `Jobrun.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Jobrun.toml")]
    pub config: PathBuf,

    /// Maximum number of jobs in flight; overrides `[config].concurrency`.
    #[arg(long, short = 'j', value_name = "N")]
    pub concurrency: Option<NonZeroUsize>,

    /// Run only the named job. May be repeated.
    #[arg(long = "job", value_name = "NAME")]
    pub jobs: Vec<String>,

    /// Do not echo job output; it is still shown for failed jobs.
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the jobs, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
