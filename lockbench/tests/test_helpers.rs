#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lockbench::config::{PoolConfig, TaskSettings};
use lockbench::lock::SharedLockState;
use lockbench::pool::WorkerPool;
use lockbench::task::{LockTask, RecordingObserver, TaskContext, TaskKind};
use lockbench_api::SubmitError;

/// Time unit used by every timing-sensitive test
pub const TIME_UNIT: Duration = Duration::from_millis(20);

/// Upper bound for waiting on asynchronous progress
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(5);

pub fn fast_settings(try_timeout_units: u64, wait_iterations: usize) -> TaskSettings {
    TaskSettings {
        time_unit: TIME_UNIT,
        try_timeout_units,
        wait_iterations,
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

/// A pool, a lock and a recording observer wired together.
pub struct Harness {
    pub pool: WorkerPool,
    pub lock: Arc<SharedLockState>,
    pub observer: Arc<RecordingObserver>,
    pub context: TaskContext,
}

impl Harness {
    pub fn new(core: usize, max: usize, keep_alive_units: u32, queue: usize) -> Self {
        Self::with_settings(core, max, keep_alive_units, queue, fast_settings(5, 10))
    }

    pub fn with_settings(
        core: usize,
        max: usize,
        keep_alive_units: u32,
        queue: usize,
        settings: TaskSettings,
    ) -> Self {
        let pool = WorkerPool::new(PoolConfig::new(
            core,
            max,
            TIME_UNIT * keep_alive_units,
            queue,
        ))
        .expect("valid pool config");
        let lock = Arc::new(SharedLockState::new());
        let observer = Arc::new(RecordingObserver::new());
        let context = TaskContext::new(Arc::clone(&lock), settings, observer.clone());

        Self {
            pool,
            lock,
            observer,
            context,
        }
    }

    pub fn submit(&self, name: &str, units: u64, kind: TaskKind) -> Result<(), SubmitError> {
        let job = self.context.job(LockTask::new(name, units, kind));
        self.pool.submit(Box::new(job))
    }

    /// Graceful shutdown, asserting the pool drains in time.
    pub fn finish(&self) {
        self.pool.shutdown();
        assert!(
            self.pool.await_termination(DEFAULT_WAIT_TIME),
            "pool did not terminate"
        );
    }
}
