// src/runner/mod.rs

//! Bounded-concurrency job runner.
//!
//! A batch is a list of [`Job`]s and a concurrency cap. [`run_in_parallel`]
//! keeps at most `cap` of them in flight and reports once all have settled.
//! Typical use is running several executions of the process executor side by
//! side, e.g. one test project per job.

pub mod job;
pub mod pool;

pub use job::{BatchError, Job, JobError, JobFailure, JobFuture};
pub use pool::run_in_parallel;
