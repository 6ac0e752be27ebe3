//! # Worker Pool Module
//!
//! A bounded pool of OS threads executing boxed [`Job`](lockbench_api::Job)s.
//!
//! ## Core Components
//! - `WorkerPool`: dispatch policy, lifecycle and shutdown
//! - `Worker`: one thread running jobs until it retires
//! - `WorkQueue`: FIFO queue, bounded or unbounded
//!
//! `WorkerPool` also implements [`PoolInspector`](lockbench_api::PoolInspector).

mod executor;
mod inspector;
mod queue;
mod worker;

pub use executor::{RunState, WorkerPool};
pub use worker::WORKER_THREAD_PREFIX;
