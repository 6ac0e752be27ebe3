//! # Pool Introspection
//!
//! Read-only view of a worker pool and its work queue. Snapshots are
//! best-effort: individual figures are read without a common lock and may be
//! slightly stale by the time they are displayed.

use std::fmt;
use std::time::Duration;

/// Remaining room in the work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCapacity {
    /// Bounded queue with this many free slots.
    Limited(usize),
    /// Unbounded queue.
    Unlimited,
}

impl fmt::Display for QueueCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueCapacity::Limited(n) => write!(f, "{}", n),
            QueueCapacity::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// Point-in-time figures describing a worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Workers currently executing a job
    pub active_count: usize,
    /// Live workers, idle or busy
    pub pool_size: usize,
    /// Jobs waiting in the work queue
    pub queue_size: usize,
    /// Idle timeout for non-core workers
    pub keep_alive: Duration,
    /// Largest pool size ever observed
    pub largest_pool_size: usize,
    /// Configured core worker count
    pub core_pool_size: usize,
    /// Configured maximum worker count
    pub maximum_pool_size: usize,
    /// Free slots left in the work queue
    pub queue_remaining_capacity: QueueCapacity,
}

impl fmt::Display for PoolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "active count          : {}", self.active_count)?;
        writeln!(f, "pool size             : {}", self.pool_size)?;
        writeln!(f, "queue size            : {}", self.queue_size)?;
        writeln!(f, "keep alive            : {:?}", self.keep_alive)?;
        writeln!(f, "largest pool size     : {}", self.largest_pool_size)?;
        writeln!(f, "core pool size        : {}", self.core_pool_size)?;
        writeln!(f, "maximum pool size     : {}", self.maximum_pool_size)?;
        write!(f, "queue remain capacity : {}", self.queue_remaining_capacity)
    }
}

/// Anything that can report a [`PoolSnapshot`]. Must be a pure read.
pub trait PoolInspector {
    fn snapshot(&self) -> PoolSnapshot;
}
