// src/exec/signal.rs

//! Signal delivery to a child's process group.
//!
//! Children are spawned as the leader of their own process group on Unix, so
//! signalling the group also reaches anything the command started itself
//! (`sh -c`, `dotnet` build servers, test hosts, ...). Other platforms only
//! have a forceful kill of the direct child.

use std::io;

use tokio::process::Child;

use crate::types::KillSignal;

/// Send `signal` to the child's process group.
///
/// A child that has already been reaped is not an error.
#[cfg(unix)]
pub(crate) fn send_signal(child: &mut Child, signal: KillSignal) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };

    match killpg(Pid::from_raw(pid as i32), Signal::from(signal)) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

#[cfg(not(unix))]
pub(crate) fn send_signal(child: &mut Child, _signal: KillSignal) -> io::Result<()> {
    force_kill(child)
}

/// Forcefully stop the child (and on Unix its whole process group).
pub(crate) fn force_kill(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    send_signal(child, KillSignal::Kill)?;

    match child.start_kill() {
        Ok(()) => Ok(()),
        // Already exited and reaped.
        Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(()),
        Err(err) => Err(err),
    }
}
