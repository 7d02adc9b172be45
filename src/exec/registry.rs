// src/exec/registry.rs

//! Registry of live children, used to stop everything on Ctrl-C.
//!
//! This is an explicit context object rather than a process-wide singleton:
//! whoever runs a batch creates one, hands clones to its jobs, and keeps one
//! for the shutdown path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use super::controller::ChildController;

#[derive(Debug, Clone, Default)]
pub struct ChildRegistry {
    children: Arc<Mutex<HashMap<String, ChildController>>>,
}

impl ChildRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly spawned child under `name`, replacing any earlier
    /// entry (a retried job registers again).
    pub fn register(&self, name: &str, controller: &ChildController) {
        debug!(job = %name, pid = ?controller.pid(), "registering child");
        self.lock().insert(name.to_string(), controller.clone());
    }

    pub fn unregister(&self, name: &str) {
        if self.lock().remove(name).is_some() {
            debug!(job = %name, "unregistering child");
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Ask every tracked child to stop. Returns how many were signalled.
    pub fn kill_all(&self) -> usize {
        let children = self.lock();
        if !children.is_empty() {
            info!(count = children.len(), "terminating running children");
        }
        for (name, controller) in children.iter() {
            debug!(job = %name, pid = ?controller.pid(), "requesting kill");
            controller.kill();
        }
        children.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ChildController>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
