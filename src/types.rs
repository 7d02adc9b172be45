// src/types.rs

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Signal sent to a child's process group when it is stopped early.
///
/// Accepted spellings are case-insensitive, with or without the `SIG`
/// prefix: `"term"`, `"SIGTERM"`, `"interrupt"`, `"int"`, ...
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum KillSignal {
    Interrupt,
    #[default]
    Terminate,
    Kill,
    Hangup,
    Quit,
}

impl KillSignal {
    /// Conventional POSIX name, e.g. `SIGTERM`.
    pub fn name(&self) -> &'static str {
        match self {
            KillSignal::Interrupt => "SIGINT",
            KillSignal::Terminate => "SIGTERM",
            KillSignal::Kill => "SIGKILL",
            KillSignal::Hangup => "SIGHUP",
            KillSignal::Quit => "SIGQUIT",
        }
    }

    /// True for signals the child cannot trap.
    pub fn is_forceful(&self) -> bool {
        matches!(self, KillSignal::Kill)
    }
}

impl fmt::Display for KillSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KillSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let bare = lowered.strip_prefix("sig").unwrap_or(&lowered);
        match bare {
            "int" | "interrupt" => Ok(KillSignal::Interrupt),
            "term" | "terminate" => Ok(KillSignal::Terminate),
            "kill" => Ok(KillSignal::Kill),
            "hup" | "hangup" => Ok(KillSignal::Hangup),
            "quit" => Ok(KillSignal::Quit),
            _ => Err(format!(
                "invalid kill_signal: {s} (expected one of \"int\", \"term\", \"kill\", \"hup\", \"quit\")"
            )),
        }
    }
}

impl TryFrom<String> for KillSignal {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(unix)]
impl From<KillSignal> for nix::sys::signal::Signal {
    fn from(signal: KillSignal) -> Self {
        use nix::sys::signal::Signal;
        match signal {
            KillSignal::Interrupt => Signal::SIGINT,
            KillSignal::Terminate => Signal::SIGTERM,
            KillSignal::Kill => Signal::SIGKILL,
            KillSignal::Hangup => Signal::SIGHUP,
            KillSignal::Quit => Signal::SIGQUIT,
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
