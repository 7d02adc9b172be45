// src/runner/job.rs

//! Job thunks and the failures a batch can report.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub type JobFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// A named, not-yet-started unit of work.
///
/// The closure is only invoked when the runner gives the job a slot, so
/// nothing runs (and no process is spawned) while the job is queued.
pub struct Job<T, E> {
    name: String,
    thunk: Box<dyn FnOnce() -> JobFuture<T, E> + Send + 'static>,
}

impl<T, E> Job<T, E> {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            name: name.into(),
            thunk: Box::new(move || Box::pin(f())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn start(self) -> (String, JobFuture<T, E>) {
        let future = (self.thunk)();
        (self.name, future)
    }
}

impl<T, E> fmt::Debug for Job<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Why a single job did not produce a value.
#[derive(Debug, Error)]
pub enum JobError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("job panicked: {0}")]
    Panicked(String),
}

impl<E> JobError<E> {
    /// The job's own error, if it returned one (rather than panicking).
    pub fn as_failed(&self) -> Option<&E> {
        match self {
            JobError::Failed(err) => Some(err),
            JobError::Panicked(_) => None,
        }
    }
}

/// One failed job inside a batch.
#[derive(Debug)]
pub struct JobFailure<E> {
    /// Position of the job in the input list.
    pub index: usize,
    pub name: String,
    pub error: JobError<E>,
}

/// Returned by `run_in_parallel` when at least one job failed.
///
/// `failures` is in settlement order, so `failures[0]` is the first job that
/// failed in wall-clock terms, not the lowest index.
#[derive(Debug)]
pub struct BatchError<E> {
    pub failures: Vec<JobFailure<E>>,
    pub total: usize,
}

impl<E> BatchError<E> {
    pub fn first(&self) -> Option<&JobFailure<E>> {
        self.failures.first()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

impl<E: fmt::Display> fmt::Display for BatchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} jobs failed", self.failures.len(), self.total)?;
        if let Some(first) = self.first() {
            write!(f, "; first: {} ({})", first.name, first.error)?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for BatchError<E> {}
