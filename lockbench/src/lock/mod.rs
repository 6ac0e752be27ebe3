//! # Shared Lock Module
//!
//! The single piece of shared mutable state in the harness: one
//! reader-writer lock with one condition bound to its write side.
//!
//! ## Key Concepts
//! - Explicit ownership: created once, passed to every task through an `Arc`
//! - Scoped acquisition: guards release on every exit path, panics included
//! - Cooperative interruption: every blocking call observes the worker's
//!   `Interrupt` token
//!
//! ## Thread Safety
//! - One internal `Mutex` guards all bookkeeping
//! - `lock_changed` wakes lock waiters, `condition` wakes await callers

mod guard;
mod state;

pub use guard::{ReadGuard, WriteGuard};
pub use state::{SharedLockState, INTERRUPT_POLL};
