use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender, TrySendError};
use lockbench_api::{BoxedJob, QueueCapacity};

/// Why an offer did not enqueue. The job is handed back to the caller.
pub(crate) enum OfferError {
    Full(BoxedJob),
    Closed(BoxedJob),
}

/// Outcome of a blocking take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TakeError {
    /// Keep-alive elapsed with nothing to run.
    TimedOut,
    /// Closed and fully drained.
    Closed,
}

/// FIFO work queue shared by all workers.
///
/// Backed by a flume channel: bounded when a capacity is configured,
/// unbounded otherwise. Closing drops the only sender, so blocked takers
/// observe `Closed` once the remaining jobs have been handed out.
pub(crate) struct WorkQueue {
    sender: Mutex<Option<Sender<BoxedJob>>>,
    receiver: Receiver<BoxedJob>,
    capacity: Option<usize>,
}

impl WorkQueue {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(bound) => flume::bounded(bound),
            None => flume::unbounded(),
        };
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
            capacity,
        }
    }

    /// Non-blocking enqueue.
    pub(crate) fn offer(&self, job: BoxedJob) -> Result<(), OfferError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            None => Err(OfferError::Closed(job)),
            Some(sender) => sender.try_send(job).map_err(|e| match e {
                TrySendError::Full(job) => OfferError::Full(job),
                TrySendError::Disconnected(job) => OfferError::Closed(job),
            }),
        }
    }

    /// Blocking dequeue. `None`, or a keep-alive too long to represent as an
    /// instant, waits indefinitely.
    pub(crate) fn take(&self, keep_alive: Option<Duration>) -> Result<BoxedJob, TakeError> {
        let deadline = keep_alive.and_then(|timeout| Instant::now().checked_add(timeout));
        match deadline {
            Some(deadline) => self.receiver.recv_deadline(deadline).map_err(|e| match e {
                RecvTimeoutError::Timeout => TakeError::TimedOut,
                RecvTimeoutError::Disconnected => TakeError::Closed,
            }),
            None => self.receiver.recv().map_err(|_| TakeError::Closed),
        }
    }

    /// Stop accepting jobs. Already queued jobs stay available to workers.
    pub(crate) fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Remove and return every queued job.
    pub(crate) fn drain(&self) -> Vec<BoxedJob> {
        self.receiver.drain().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.receiver.len()
    }

    pub(crate) fn remaining_capacity(&self) -> QueueCapacity {
        match self.capacity {
            Some(bound) => QueueCapacity::Limited(bound.saturating_sub(self.len())),
            None => QueueCapacity::Unlimited,
        }
    }
}
