use crate::interrupt::Interrupt;

/// A runnable unit executed by a pool worker.
///
/// Jobs are consumed exactly once: the worker takes ownership and calls
/// [`Job::run`]. Implementations must not let failures escape `run`; report
/// them and return.
pub trait Job: Send + 'static {
    /// Display name used in logs and rejection reports. Not required to be
    /// unique.
    fn name(&self) -> &str;

    /// Execute the job on the calling worker thread.
    ///
    /// `interrupt` belongs to the executing worker and fires when the pool is
    /// forcibly stopped.
    fn run(self: Box<Self>, interrupt: &Interrupt);
}

pub type BoxedJob = Box<dyn Job>;
