use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use lockbench_api::{BoxedJob, ConfigError, Interrupt, Job, SubmitError};
use tracing::{error, info, warn};

use crate::config::PoolConfig;
use crate::log_pool;

use super::queue::{OfferError, TakeError, WorkQueue};
use super::worker::Worker;

/// Lifecycle of the pool. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    /// Accepting submissions.
    Running,
    /// No new submissions; queued jobs still run.
    Shutdown,
    /// No new submissions; queue discarded, workers interrupted.
    Stop,
    /// Shut down and every worker has exited.
    Terminated,
}

struct WorkerHandle {
    interrupt: Interrupt,
    // Detached when the worker retires itself.
    _thread: JoinHandle<()>,
}

pub(crate) struct PoolState {
    pub(crate) run_state: RunState,
    pub(crate) pool_size: usize,
    pub(crate) largest_pool_size: usize,
    pub(crate) active_count: usize,
    pub(crate) completed_jobs: u64,
    next_worker_id: usize,
    workers: HashMap<usize, WorkerHandle>,
}

/// State shared between the pool handle and its workers.
pub(crate) struct PoolShared {
    pub(crate) config: PoolConfig,
    pub(crate) queue: WorkQueue,
    state: Mutex<PoolState>,
    termination: Condvar,
}

impl PoolShared {
    pub(crate) fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn job_started(&self) {
        self.state().active_count += 1;
    }

    pub(crate) fn job_finished(&self) {
        let mut state = self.state();
        state.active_count = state.active_count.saturating_sub(1);
        state.completed_jobs += 1;
    }

    /// Next job for worker `worker_id`, or `None` once the worker must exit.
    ///
    /// A `None` return has already removed the worker from the pool.
    pub(crate) fn next_job(&self, worker_id: usize) -> Option<BoxedJob> {
        loop {
            let keep_alive = {
                let state = self.state();
                if state.run_state >= RunState::Stop {
                    return self.retire(state, worker_id, "pool stopped");
                }
                (state.pool_size > self.config.core_pool_size).then_some(self.config.keep_alive)
            };

            match self.queue.take(keep_alive) {
                Ok(job) => {
                    let state = self.state();
                    if state.run_state >= RunState::Stop {
                        warn!(worker_id, job = %job.name(), "Discarding job dequeued after stop");
                        return self.retire(state, worker_id, "pool stopped");
                    }
                    return Some(job);
                }
                Err(TakeError::Closed) => {
                    return self.retire(self.state(), worker_id, "queue closed");
                }
                Err(TakeError::TimedOut) => {
                    // Re-checked under the lock so concurrent timeouts cannot
                    // shrink the pool below core size, and the last worker
                    // never leaves a job queued behind it.
                    let state = self.state();
                    if state.pool_size > self.config.core_pool_size
                        && (state.pool_size > 1 || self.queue.len() == 0)
                    {
                        return self.retire(state, worker_id, "keep-alive expired");
                    }
                }
            }
        }
    }

    fn retire(
        &self,
        mut state: MutexGuard<'_, PoolState>,
        worker_id: usize,
        reason: &str,
    ) -> Option<BoxedJob> {
        state.pool_size = state.pool_size.saturating_sub(1);
        state.workers.remove(&worker_id);
        log_pool!(
            "worker_retired",
            worker_id = worker_id,
            reason = reason,
            pool_size = state.pool_size
        );
        self.try_terminate(&mut state);
        None
    }

    fn try_terminate(&self, state: &mut PoolState) {
        if state.pool_size == 0
            && matches!(state.run_state, RunState::Shutdown | RunState::Stop)
        {
            state.run_state = RunState::Terminated;
            info!(
                completed_jobs = state.completed_jobs,
                largest_pool_size = state.largest_pool_size,
                "Worker pool terminated"
            );
            self.termination.notify_all();
        }
    }
}

/// # Worker Pool
///
/// A bounded pool of OS worker threads fed from a FIFO work queue.
///
/// ## Dispatch policy
/// 1. Fewer live workers than core size, or no live worker at all: start a
///    worker with the job
/// 2. Otherwise enqueue, if the queue has room
/// 3. Otherwise, fewer live workers than maximum: start a surplus worker with
///    the job
/// 4. Otherwise reject
///
/// Workers are started lazily. Surplus workers that find no work within the
/// keep-alive retire.
///
/// ## Shutdown
/// [`shutdown`](Self::shutdown) lets queued and running jobs finish.
/// [`shutdown_now`](Self::shutdown_now) discards the queue and interrupts
/// every worker. [`await_termination`](Self::await_termination) blocks until
/// the last worker has exited.
///
/// Dropping the pool performs a graceful `shutdown` if none was requested.
pub struct WorkerPool {
    pub(crate) shared: Arc<PoolShared>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state();
        f.debug_struct("WorkerPool")
            .field("config", &self.shared.config)
            .field("run_state", &state.run_state)
            .field("pool_size", &state.pool_size)
            .field("active_count", &state.active_count)
            .field("queue_size", &self.shared.queue.len())
            .finish()
    }
}

impl WorkerPool {
    /// Create an idle pool. No worker starts before the first submission.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let queue = WorkQueue::new(config.bounded_capacity());
        info!(
            core_pool_size = config.core_pool_size,
            maximum_pool_size = config.maximum_pool_size,
            keep_alive = ?config.keep_alive,
            queue_capacity = config.queue_capacity,
            "Worker pool created"
        );

        Ok(Self {
            shared: Arc::new(PoolShared {
                config,
                queue,
                state: Mutex::new(PoolState {
                    run_state: RunState::Running,
                    pool_size: 0,
                    largest_pool_size: 0,
                    active_count: 0,
                    completed_jobs: 0,
                    next_worker_id: 1,
                    workers: HashMap::new(),
                }),
                termination: Condvar::new(),
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    /// Hand `job` to the pool. Never blocks on the queue.
    pub fn submit(&self, job: BoxedJob) -> Result<(), SubmitError> {
        let core = self.shared.config.core_pool_size;
        let maximum = self.shared.config.maximum_pool_size;
        let mut state = self.shared.state();

        if state.run_state != RunState::Running {
            return Err(SubmitError::ShutDown(job.name().to_string()));
        }

        // An empty pool always starts a worker carrying the job, so a failed
        // start never leaves the job queued with nobody to run it.
        if state.pool_size < core || state.pool_size == 0 {
            return self.add_worker(&mut state, job.name().to_string(), Some(job));
        }

        match self.shared.queue.offer(job) {
            Ok(()) => {
                log_pool!("job_queued", queue_size = self.shared.queue.len());
                Ok(())
            }
            Err(OfferError::Full(job)) if state.pool_size < maximum => {
                self.add_worker(&mut state, job.name().to_string(), Some(job))
            }
            Err(OfferError::Full(job)) => {
                let queue_size = self.shared.queue.len();
                warn!(
                    job = %job.name(),
                    pool_size = state.pool_size,
                    queue_size,
                    "Job rejected"
                );
                Err(SubmitError::Rejected {
                    job: job.name().to_string(),
                    pool_size: state.pool_size,
                    maximum_pool_size: maximum,
                    queue_size,
                })
            }
            Err(OfferError::Closed(job)) => Err(SubmitError::ShutDown(job.name().to_string())),
        }
    }

    /// Convenience wrapper boxing `job`.
    pub fn execute<J: Job>(&self, job: J) -> Result<(), SubmitError> {
        self.submit(Box::new(job))
    }

    fn add_worker(
        &self,
        state: &mut PoolState,
        job_name: String,
        first_job: Option<BoxedJob>,
    ) -> Result<(), SubmitError> {
        let id = state.next_worker_id;
        state.next_worker_id += 1;

        let interrupt = Interrupt::new();
        let worker = Worker::new(id, first_job, Arc::clone(&self.shared), interrupt.clone());

        // The new thread cannot observe the pool before `state` is released,
        // so registration below always precedes its first `next_job`.
        match worker.spawn() {
            Ok(thread) => {
                state.pool_size += 1;
                state.largest_pool_size = state.largest_pool_size.max(state.pool_size);
                state.workers.insert(
                    id,
                    WorkerHandle {
                        interrupt,
                        _thread: thread,
                    },
                );
                log_pool!(
                    "worker_started",
                    worker_id = id,
                    pool_size = state.pool_size
                );
                Ok(())
            }
            Err(e) => {
                error!(worker_id = id, error = %e, "Failed to start worker thread");
                Err(SubmitError::WorkerStart {
                    job: job_name,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Stop accepting submissions. Queued and running jobs still complete.
    pub fn shutdown(&self) {
        let mut state = self.shared.state();
        if state.run_state < RunState::Shutdown {
            state.run_state = RunState::Shutdown;
            info!(
                pool_size = state.pool_size,
                queue_size = self.shared.queue.len(),
                "Worker pool shutting down"
            );
        }
        self.shared.queue.close();
        self.shared.try_terminate(&mut state);
    }

    /// Stop accepting submissions, discard queued jobs and interrupt every
    /// worker. Returns how many queued jobs were discarded.
    pub fn shutdown_now(&self) -> usize {
        let discarded = {
            let mut state = self.shared.state();
            if state.run_state < RunState::Stop {
                state.run_state = RunState::Stop;
            }
            self.shared.queue.close();
            let discarded = self.shared.queue.drain();
            for handle in state.workers.values() {
                handle.interrupt.interrupt();
            }
            warn!(
                pool_size = state.pool_size,
                discarded = discarded.len(),
                "Worker pool stopping, interrupting workers"
            );
            self.shared.try_terminate(&mut state);
            discarded
        };
        discarded.len()
    }

    /// Block until the pool has terminated or `timeout` elapses.
    ///
    /// Returns `true` if the pool terminated. Does not itself shut the pool
    /// down.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let state = self.shared.state();
        let (state, _) = self
            .shared
            .termination
            .wait_timeout_while(state, timeout, |state| {
                state.run_state != RunState::Terminated
            })
            .unwrap_or_else(PoisonError::into_inner);
        state.run_state == RunState::Terminated
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.state().run_state >= RunState::Shutdown
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.state().run_state == RunState::Terminated
    }

    pub fn run_state(&self) -> RunState {
        self.shared.state().run_state
    }

    /// Jobs that ran to completion or panicked.
    pub fn completed_job_count(&self) -> u64 {
        self.shared.state().completed_jobs
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.is_shutdown() {
            self.shutdown();
        }
    }
}
