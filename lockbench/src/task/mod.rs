//! # Task Module
//!
//! The five task behaviours driven against the shared lock, and the job
//! wrapper that lets the worker pool run them without knowing what they do.
//!
//! ## Behaviours
//! - `READ`: read lock, sleep, release
//! - `WRITE`: write lock, sleep, release
//! - `TRY`: timed write lock; on success sleep and release, otherwise report
//! - `WAIT`: write lock, then repeated sleep / await / awaken rounds, release
//! - `SIGNAL`: write lock, signal one waiter, release

pub mod job;
pub mod kind;
pub mod lock_task;
pub mod observer;

pub use job::{LockJob, TaskContext};
pub use kind::{TaskFamily, TaskKind, UnknownTaskKind};
pub use lock_task::{LockTask, TaskOutcome, TaskState};
pub use observer::{LogObserver, RecordedEvent, RecordingObserver, TaskEvent, TaskObserver};
