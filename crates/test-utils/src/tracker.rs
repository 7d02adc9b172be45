use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts how many job bodies are running at once.
///
/// Each job calls [`ActivityTracker::enter`] at the top of its body and keeps the
/// returned guard alive until it is done.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    inner: Arc<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    active: AtomicUsize,
    max_active: AtomicUsize,
    invocations: AtomicUsize,
    /// `(label, "start" | "end")`, in the order they happened.
    events: Mutex<Vec<(String, &'static str)>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, label: impl Into<String>) -> ActiveGuard {
        let label = label.into();
        let now = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_active.fetch_max(now, Ordering::SeqCst);
        self.inner.invocations.fetch_add(1, Ordering::SeqCst);
        self.inner.events.lock().unwrap().push((label.clone(), "start"));
        ActiveGuard {
            tracker: self.clone(),
            label,
        }
    }

    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.inner.max_active.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> usize {
        self.inner.invocations.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<(String, &'static str)> {
        self.inner.events.lock().unwrap().clone()
    }
}

/// Decrements the tracker's active count when dropped.
pub struct ActiveGuard {
    tracker: ActivityTracker,
    label: String,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.tracker
            .inner
            .events
            .lock()
            .unwrap()
            .push((std::mem::take(&mut self.label), "end"));
        self.tracker.inner.active.fetch_sub(1, Ordering::SeqCst);
    }
}
