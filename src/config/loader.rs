// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML (unknown keys are errors).
/// - Checks job names, concurrency, retries.
/// - Splits every `cmd` and parses every duration.
/// - Resolves relative job `cwd`s against the config file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let mut config = ConfigFile::try_from(raw_config)?;

    let root = config_root_dir(path);
    for job in config.jobs.iter_mut() {
        if let Some(cwd) = job.cwd.as_mut() {
            if cwd.is_relative() {
                *cwd = root.join(&*cwd);
            }
        }
    }

    Ok(config)
}

/// Default config file in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Jobrun.toml")
}

/// Directory relative job paths are resolved against.
///
/// - `configs/Jobrun.toml` -> `configs`
/// - bare `Jobrun.toml` (empty parent) -> the current working directory
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
