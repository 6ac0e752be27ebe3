//! # Error Types
//!
//! Errors shared by the lock state, the worker pool and the harness
//! configuration.
//!
//! ## Core Components
//!
//! - `LockError`: failures of blocking lock operations
//! - `SubmitError`: a job could not be handed to the pool
//! - `ConfigError`: startup parameters that cannot describe a valid pool
//!
//! ## Usage Example
//!
//! ```rust
//! use lockbench_api::errors::LockError;
//!
//! fn report(error: LockError) {
//!     match error {
//!         LockError::Interrupted => println!("interrupted while blocked"),
//!         LockError::IllegalState(msg) => println!("lock misuse: {}", msg),
//!     }
//! }
//! ```

use thiserror::Error;

/// Failure of a shared lock or condition operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The calling worker was interrupted while blocked or sleeping.
    ///
    /// This is the cancellation signal surfaced to tasks; it is terminal for
    /// the task that observes it.
    #[error("Interrupted while waiting")]
    Interrupted,

    /// A release, await or signal was issued by a thread that does not hold
    /// the matching acquisition.
    ///
    /// # Parameters
    /// * String - Which operation was misused and why
    #[error("Illegal lock state: {0}")]
    IllegalState(String),
}

/// Failure to hand a job to the worker pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The queue is full and the pool already runs its maximum number of
    /// workers.
    #[error(
        "Job {job} rejected: pool size {pool_size} at maximum {maximum_pool_size}, queue full ({queue_size} queued)"
    )]
    Rejected {
        job: String,
        pool_size: usize,
        maximum_pool_size: usize,
        queue_size: usize,
    },

    /// The pool has been shut down and no longer accepts work.
    #[error("Job {0} rejected: pool is shut down")]
    ShutDown(String),

    /// A worker thread was needed but the OS refused to start it.
    #[error("Job {job} rejected: failed to start worker: {reason}")]
    WorkerStart { job: String, reason: String },
}

impl SubmitError {
    /// Name of the job that was refused.
    pub fn job(&self) -> &str {
        match self {
            SubmitError::Rejected { job, .. } => job,
            SubmitError::ShutDown(job) => job,
            SubmitError::WorkerStart { job, .. } => job,
        }
    }
}

/// Startup parameters that do not describe a valid pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Maximum worker count is zero or below the core worker count.
    #[error("Invalid pool size: core {core} / maximum {maximum} (maximum must be >= core and > 0)")]
    InvalidPoolSize { core: usize, maximum: usize },

    /// Any other setting outside its accepted range.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}
