// src/exec/cmdline.rs

//! Turning a one-line command string into an argument vector.
//!
//! Config files describe a job as `cmd = "dotnet test \"My Tests.csproj\""`.
//! The executor never goes through a shell, so the string is split here:
//! whitespace separates arguments, and a double- or single-quoted segment
//! stays one argument with its quotes removed. Quoted and bare pieces that
//! touch (`--name="a b"`) join into a single argument. No quotes are ever
//! added; platform quoting is left to the spawn primitive.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{JobrunError, Result};

static PIECE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"|'([^']*)'|([^\s"']+)|(\s+)"#).expect("command-line pattern is valid")
});

/// Split a command string into arguments.
pub fn split_command_line(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current: Option<String> = None;
    let mut pos = 0;

    for caps in PIECE.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // Anything the pattern skipped over is an unmatched quote.
        if whole.start() != pos {
            return Err(unterminated_quote(line, pos));
        }
        pos = whole.end();

        if caps.get(4).is_some() {
            if let Some(arg) = current.take() {
                args.push(arg);
            }
            continue;
        }

        let text = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        current.get_or_insert_with(String::new).push_str(text);
    }

    if pos != line.len() {
        return Err(unterminated_quote(line, pos));
    }
    if let Some(arg) = current {
        args.push(arg);
    }

    Ok(args)
}

/// Split a command string into `(executable, args)`.
pub fn parse_command_line(line: &str) -> Result<(String, Vec<String>)> {
    let mut args = split_command_line(line)?;
    if args.is_empty() {
        return Err(JobrunError::CommandLine("command is empty".to_string()));
    }
    let exe = args.remove(0);
    if exe.is_empty() {
        return Err(JobrunError::CommandLine(format!(
            "executable name is empty in `{line}`"
        )));
    }
    Ok((exe, args))
}

fn unterminated_quote(line: &str, pos: usize) -> JobrunError {
    JobrunError::CommandLine(format!("unterminated quote at offset {pos} in `{line}`"))
}
