use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lockbench_api::{BoxedJob, Interrupt};
use tracing::{debug, error};

use super::executor::PoolShared;

/// Prefix of every worker thread name.
pub const WORKER_THREAD_PREFIX: &str = "lockbench-worker";

/// # Pool Worker
///
/// One OS thread of the `WorkerPool`. Runs an optional first job, then pulls
/// jobs from the shared queue until the pool tells it to retire.
///
/// ## Core Algorithm
/// 1. Run the first job, if the worker was started with one
/// 2. Ask the pool for the next job; core workers block indefinitely,
///    surplus workers wait at most the keep-alive
/// 3. Run it with panics caught, so a failing job never takes the worker down
/// 4. Exit when the pool returns no job; the pool has already unregistered it
pub(crate) struct Worker {
    id: usize,
    first_job: Option<BoxedJob>,
    shared: Arc<PoolShared>,
    interrupt: Interrupt,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("interrupted", &self.interrupt.is_interrupted())
            .finish()
    }
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        first_job: Option<BoxedJob>,
        shared: Arc<PoolShared>,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            id,
            first_job,
            shared,
            interrupt,
        }
    }

    pub(crate) fn thread_name(id: usize) -> String {
        format!("{}-{}", WORKER_THREAD_PREFIX, id)
    }

    /// Start the worker on its own named thread.
    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(Self::thread_name(self.id))
            .spawn(move || self.run())
    }

    fn run(mut self) {
        debug!(worker_id = self.id, "Worker started");

        let mut next = self.first_job.take();
        loop {
            let job = match next.take() {
                Some(job) => job,
                None => match self.shared.next_job(self.id) {
                    Some(job) => job,
                    None => break,
                },
            };
            self.run_job(job);
        }

        debug!(worker_id = self.id, "Worker exited");
    }

    fn run_job(&self, job: BoxedJob) {
        let name = job.name().to_string();
        self.shared.job_started();

        let interrupt = &self.interrupt;
        let result = panic::catch_unwind(AssertUnwindSafe(move || job.run(interrupt)));
        if let Err(payload) = result {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(worker_id = self.id, job = %name, panic = %message, "Job panicked");
        }

        self.shared.job_finished();
    }
}
