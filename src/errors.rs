// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::exec::ExecutionError;

#[derive(Error, Debug)]
pub enum JobrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid command line: {0}")]
    CommandLine(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("Job '{0}' cancelled before it started")]
    Cancelled(String),

    #[error("{failed} of {total} jobs failed")]
    BatchFailed { failed: usize, total: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobrunError>;
