//! Background execution of generation tasks.
//!
//! [`GenerationService`] registers a task, hands the pipeline run to a
//! bounded [`WorkerPool`] and finalises the task from the worker. The
//! caller's identity is passed explicitly into the job and re-established
//! there as a task-local. [`CleanupScheduler`] evicts old tasks on an
//! interval.

mod cleanup;
mod identity;
mod pool;
mod service;

#[cfg(test)]
mod integration_tests;

pub use cleanup::{run_cleanup_pass, CleanupHandle, CleanupScheduler};
pub use identity::{current_caller, with_caller, CallerIdentity};
pub use pool::{Job, Submission, WorkerPool};
pub use service::GenerationService;
