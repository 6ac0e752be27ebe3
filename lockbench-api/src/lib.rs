//! # Lockbench API
//!
//! Interfaces shared between the lockbench worker pool and the work it runs.
//!
//! The pool never looks inside the work it executes: everything it needs is
//! expressed through the small set of types in this crate.
//!
//! ## Core Components
//!
//! - **Job**: a runnable unit consumed exactly once by a worker thread
//! - **Interrupt**: cooperative interruption token handed to every running job
//! - **PoolSnapshot**: best-effort view of pool and queue state
//! - **Errors**: lock, submission and configuration failures
//!
//! ## Usage Example
//!
//! ```rust
//! use lockbench_api::{Interrupt, Job};
//!
//! struct Hello;
//!
//! impl Job for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!
//!     fn run(self: Box<Self>, interrupt: &Interrupt) {
//!         if interrupt.check().is_ok() {
//!             println!("hello from a worker");
//!         }
//!     }
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`job`]: the runnable-unit abstraction
//! - [`interrupt`]: interruption token and interruptible sleep
//! - [`snapshot`]: pool introspection types
//! - [`errors`]: error types

pub mod errors;
pub mod interrupt;
pub mod job;
pub mod snapshot;

pub use errors::{ConfigError, LockError, SubmitError};
pub use interrupt::Interrupt;
pub use job::{BoxedJob, Job};
pub use snapshot::{PoolInspector, PoolSnapshot, QueueCapacity};
