use lockbench_api::{PoolInspector, PoolSnapshot};

use super::executor::WorkerPool;

impl PoolInspector for WorkerPool {
    /// Worker figures are read under the pool lock, queue figures straight
    /// from the channel, so the two halves may be momentarily out of step.
    fn snapshot(&self) -> PoolSnapshot {
        let (active_count, pool_size, largest_pool_size) = {
            let state = self.shared.state();
            (state.active_count, state.pool_size, state.largest_pool_size)
        };
        let config = &self.shared.config;

        PoolSnapshot {
            active_count,
            pool_size,
            queue_size: self.shared.queue.len(),
            keep_alive: config.keep_alive,
            largest_pool_size,
            core_pool_size: config.core_pool_size,
            maximum_pool_size: config.maximum_pool_size,
            queue_remaining_capacity: self.shared.queue.remaining_capacity(),
        }
    }
}
