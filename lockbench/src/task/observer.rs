use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use super::kind::TaskKind;

/// Notification emitted by a running task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// Lock held, about to sleep for the task's duration.
    Started,
    /// Sleep finished, lock still held.
    Finished,
    /// Returned from an await round (1-based).
    Awakened { iteration: usize },
    /// Signal issued; `woke_waiter` is false when nobody was waiting.
    Signalled { woke_waiter: bool },
    /// Timed write acquisition gave up without ever holding the lock.
    AcquireFailed,
    /// Execution aborted (interruption or lock misuse).
    Failed(String),
}

/// Receives task notifications. Called from worker threads.
pub trait TaskObserver: Send + Sync {
    fn notify(&self, task: &str, kind: TaskKind, event: &TaskEvent);
}

/// Emits every task notification as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl TaskObserver for LogObserver {
    fn notify(&self, task: &str, kind: TaskKind, event: &TaskEvent) {
        match event {
            TaskEvent::Started => crate::log_task!(task, "started", kind = %kind),
            TaskEvent::Finished => crate::log_task!(task, "finished", kind = %kind),
            TaskEvent::Awakened { iteration } => {
                crate::log_task!(task, "awakened", kind = %kind, iteration = *iteration)
            }
            TaskEvent::Signalled { woke_waiter } => {
                crate::log_task!(task, "signalled", kind = %kind, woke_waiter = *woke_waiter)
            }
            TaskEvent::AcquireFailed => {
                tracing::warn!(task = %task, kind = %kind, event = "acquire_failed", "failed to acquire lock")
            }
            TaskEvent::Failed(reason) => {
                tracing::error!(task = %task, kind = %kind, event = "failed", reason = %reason)
            }
        }
    }
}

/// One notification captured by [`RecordingObserver`].
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub task: String,
    pub kind: TaskKind,
    pub event: TaskEvent,
    pub at: Instant,
}

/// Keeps every notification in memory, in arrival order.
///
/// Useful for asserting interleavings after the fact.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Notifications emitted by tasks named `task`, in order.
    pub fn events_for(&self, task: &str) -> Vec<TaskEvent> {
        self.events()
            .into_iter()
            .filter(|recorded| recorded.task == task)
            .map(|recorded| recorded.event)
            .collect()
    }

    /// First time `task` emitted `event`, if ever.
    pub fn first(&self, task: &str, event: &TaskEvent) -> Option<Instant> {
        self.events()
            .into_iter()
            .find(|recorded| recorded.task == task && &recorded.event == event)
            .map(|recorded| recorded.at)
    }

    pub fn count(&self, task: &str, predicate: impl Fn(&TaskEvent) -> bool) -> usize {
        self.events_for(task).iter().filter(|e| predicate(e)).count()
    }
}

impl TaskObserver for RecordingObserver {
    fn notify(&self, task: &str, kind: TaskKind, event: &TaskEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent {
                task: task.to_string(),
                kind,
                event: event.clone(),
                at: Instant::now(),
            });
    }
}
