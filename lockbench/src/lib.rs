//! # Lockbench
//!
//! An interactive harness for exercising a bounded worker pool against one
//! shared reader-writer lock and its condition.
//!
//! The operator submits read, write, try-write, wait and signal tasks from
//! the console and inspects the pool at will. Every task runs on a pool
//! worker and coordinates only through [`lock::SharedLockState`].
//!
//! ## Layout
//! - [`lock`]: the shared lock, its condition and scoped guards
//! - [`task`]: the five task behaviours and the job wrapper
//! - [`pool`]: the worker pool and its snapshot
//! - [`driver`]: command parsing and the console loop
//! - [`cli`], [`config`], [`logging`], [`error`]: ambient plumbing
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lockbench::config::HarnessConfig;
//! use lockbench::driver::Driver;
//! use lockbench::task::LogObserver;
//!
//! # async fn demo() -> Result<(), lockbench::error::HarnessError> {
//! let driver = Driver::from_config(&HarnessConfig::default(), Arc::new(LogObserver))?;
//! let mut output = tokio::io::stdout();
//! let input = tokio::io::BufReader::new(tokio::io::stdin());
//! let summary = driver.run(input, &mut output).await?;
//! println!("{:?}", summary);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod lock;
pub mod logging;
pub mod pool;
pub mod task;

pub use config::{HarnessConfig, PoolConfig, TaskSettings};
pub use driver::{Driver, DriverSummary};
pub use error::{HarnessError, HarnessResult};
pub use lock::SharedLockState;
pub use pool::WorkerPool;
pub use task::{LockTask, TaskKind};

pub use lockbench_api::{Interrupt, Job, PoolInspector, PoolSnapshot, QueueCapacity};
