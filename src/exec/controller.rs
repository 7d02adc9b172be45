// src/exec/controller.rs

//! Caller-side kill handle for a running child process.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Handle handed to `on_child_spawned` hooks (and kept by the executor).
///
/// Cloning is cheap; every clone controls the same child. `kill()` only
/// *requests* termination: the executor that owns the child delivers the
/// configured kill signal to its process group and keeps collecting output
/// until the process is gone.
#[derive(Debug, Clone)]
pub struct ChildController {
    inner: Arc<ControlState>,
}

#[derive(Debug)]
struct ControlState {
    pid: Option<u32>,
    killed: AtomicBool,
    kill_requested: Notify,
}

impl ChildController {
    pub(crate) fn new(pid: Option<u32>) -> Self {
        Self {
            inner: Arc::new(ControlState {
                pid,
                killed: AtomicBool::new(false),
                kill_requested: Notify::new(),
            }),
        }
    }

    /// OS process id of the child (also its process group id on Unix).
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid
    }

    /// Ask the executor to terminate the child. Repeated calls are no-ops.
    pub fn kill(&self) {
        if !self.inner.killed.swap(true, Ordering::SeqCst) {
            // notify_one stores a permit, so a kill issued from inside the
            // spawn hook is seen once the executor starts waiting.
            self.inner.kill_requested.notify_one();
        }
    }

    /// True once the child was killed, either through [`Self::kill`] or by
    /// the executor's timeout.
    pub fn is_killed(&self) -> bool {
        self.inner.killed.load(Ordering::SeqCst)
    }

    /// Record a kill initiated by the executor itself (timeout).
    pub(crate) fn mark_killed(&self) {
        self.inner.killed.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn kill_requested(&self) {
        self.inner.kill_requested.notified().await;
    }
}
