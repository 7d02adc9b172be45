// src/runner/pool.rs

use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;

use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use super::job::{BatchError, Job, JobError, JobFailure};

/// Run `jobs` with at most `concurrency` in flight, and wait for all of them.
///
/// - The first `concurrency` jobs start immediately, in input order. Every
///   time a job settles, the next queued job starts.
/// - A failing (or panicking) job never stops the others: the call returns
///   only once every job has settled, and every job runs exactly once.
/// - On success the outputs are returned in input order. Otherwise every
///   failure is reported in settlement order.
///
/// There is no retry, no timeout and no cancellation here; jobs that need
/// them bring their own.
pub async fn run_in_parallel<T, E, I>(
    concurrency: NonZeroUsize,
    jobs: I,
) -> Result<Vec<T>, BatchError<E>>
where
    I: IntoIterator<Item = Job<T, E>>,
    T: Send + 'static,
    E: Send + 'static,
{
    let mut pending: VecDeque<(usize, Job<T, E>)> = jobs.into_iter().enumerate().collect();
    let total = pending.len();
    let limit = concurrency.get();

    if total == 0 {
        debug!("no jobs to run");
        return Ok(Vec::new());
    }

    debug!(total, concurrency = limit, "starting job batch");

    let mut active: JoinSet<Result<T, E>> = JoinSet::new();
    let mut in_flight: HashMap<tokio::task::Id, (usize, String)> = HashMap::new();
    let mut outputs: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut failures: Vec<JobFailure<E>> = Vec::new();

    loop {
        // Fill free slots. `active.len()` still counts settled-but-unjoined
        // tasks, so a slot is only reused after its job has been joined.
        while active.len() < limit {
            let Some((index, job)) = pending.pop_front() else {
                break;
            };
            let (name, future) = job.start();
            let handle = active.spawn(future);
            debug!(job = %name, index, active = active.len(), "job started");
            in_flight.insert(handle.id(), (index, name));
        }

        let Some(joined) = active.join_next_with_id().await else {
            break;
        };

        match joined {
            Ok((id, outcome)) => {
                let Some((index, name)) = in_flight.remove(&id) else {
                    continue;
                };
                match outcome {
                    Ok(value) => {
                        debug!(job = %name, index, "job succeeded");
                        outputs[index] = Some(value);
                    }
                    Err(err) => {
                        debug!(job = %name, index, "job failed");
                        failures.push(JobFailure {
                            index,
                            name,
                            error: JobError::Failed(err),
                        });
                    }
                }
            }
            Err(join_err) => {
                let Some((index, name)) = in_flight.remove(&join_err.id()) else {
                    continue;
                };
                warn!(job = %name, index, error = %join_err, "job did not complete");
                failures.push(JobFailure {
                    index,
                    name,
                    error: JobError::Panicked(panic_message(join_err)),
                });
            }
        }
    }

    if failures.is_empty() {
        info!(total, "all jobs succeeded");
        Ok(outputs.into_iter().flatten().collect())
    } else {
        info!(total, failed = failures.len(), "job batch finished with failures");
        Err(BatchError { failures, total })
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
