use std::fmt;

use lockbench_api::{Interrupt, LockError};

use crate::config::TaskSettings;
use crate::lock::SharedLockState;

use super::kind::TaskKind;
use super::observer::{TaskEvent, TaskObserver};

/// Lifecycle of a single task: `Created -> Running -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Created => "created",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// How a task execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// Try-write timed out; the lock was never held.
    LockUnavailable,
    /// Interrupted or misused the lock. Any held acquisition was released.
    Failed(LockError),
}

impl TaskOutcome {
    /// Terminal lifecycle state for this outcome.
    pub fn state(&self) -> TaskState {
        match self {
            TaskOutcome::Completed => TaskState::Completed,
            TaskOutcome::LockUnavailable | TaskOutcome::Failed(_) => TaskState::Failed,
        }
    }
}

/// One operator-submitted task: a name, a duration in time units and a
/// behaviour.
///
/// Consumed by exactly one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTask {
    name: String,
    duration_units: u64,
    kind: TaskKind,
}

impl LockTask {
    /// Names are normalised to upper case.
    pub fn new(name: impl AsRef<str>, duration_units: u64, kind: TaskKind) -> Self {
        Self {
            name: name.as_ref().trim().to_uppercase(),
            duration_units,
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_units(&self) -> u64 {
        self.duration_units
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Run the task body against `lock`.
    ///
    /// Never propagates failures: they are reported through `observer` and
    /// returned as [`TaskOutcome::Failed`]. Every acquisition taken here is
    /// released before returning.
    pub fn execute(
        &self,
        lock: &SharedLockState,
        interrupt: &Interrupt,
        settings: &TaskSettings,
        observer: &dyn TaskObserver,
    ) -> TaskOutcome {
        let result = match self.kind {
            TaskKind::Read => self.run_read(lock, interrupt, settings, observer),
            TaskKind::Write => self.run_write(lock, interrupt, settings, observer),
            TaskKind::TryWrite => self.run_try_write(lock, interrupt, settings, observer),
            TaskKind::Wait => self.run_wait(lock, interrupt, settings, observer),
            TaskKind::Signal => self.run_signal(lock, interrupt, observer),
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.emit(observer, TaskEvent::Failed(e.to_string()));
                TaskOutcome::Failed(e)
            }
        }
    }

    fn emit(&self, observer: &dyn TaskObserver, event: TaskEvent) {
        observer.notify(&self.name, self.kind, &event);
    }

    // Critical section body shared by the lock variants and each wait round.
    fn hold(
        &self,
        interrupt: &Interrupt,
        settings: &TaskSettings,
        observer: &dyn TaskObserver,
    ) -> Result<(), LockError> {
        self.emit(observer, TaskEvent::Started);
        interrupt.sleep(settings.units(self.duration_units))?;
        self.emit(observer, TaskEvent::Finished);
        Ok(())
    }

    fn run_read(
        &self,
        lock: &SharedLockState,
        interrupt: &Interrupt,
        settings: &TaskSettings,
        observer: &dyn TaskObserver,
    ) -> Result<TaskOutcome, LockError> {
        let _guard = lock.read(interrupt)?;
        self.hold(interrupt, settings, observer)?;
        Ok(TaskOutcome::Completed)
    }

    fn run_write(
        &self,
        lock: &SharedLockState,
        interrupt: &Interrupt,
        settings: &TaskSettings,
        observer: &dyn TaskObserver,
    ) -> Result<TaskOutcome, LockError> {
        let _guard = lock.write(interrupt)?;
        self.hold(interrupt, settings, observer)?;
        Ok(TaskOutcome::Completed)
    }

    fn run_try_write(
        &self,
        lock: &SharedLockState,
        interrupt: &Interrupt,
        settings: &TaskSettings,
        observer: &dyn TaskObserver,
    ) -> Result<TaskOutcome, LockError> {
        match lock.try_write(settings.try_timeout(), interrupt)? {
            Some(_guard) => {
                self.hold(interrupt, settings, observer)?;
                Ok(TaskOutcome::Completed)
            }
            None => {
                self.emit(observer, TaskEvent::AcquireFailed);
                Ok(TaskOutcome::LockUnavailable)
            }
        }
    }

    // Holds the write lock across all rounds except while suspended in await.
    // Without enough signals this stays suspended until interrupted.
    fn run_wait(
        &self,
        lock: &SharedLockState,
        interrupt: &Interrupt,
        settings: &TaskSettings,
        observer: &dyn TaskObserver,
    ) -> Result<TaskOutcome, LockError> {
        let mut guard = lock.write(interrupt)?;
        for iteration in 1..=settings.wait_iterations {
            self.hold(interrupt, settings, observer)?;
            guard.await_signal(interrupt)?;
            self.emit(observer, TaskEvent::Awakened { iteration });
        }
        Ok(TaskOutcome::Completed)
    }

    fn run_signal(
        &self,
        lock: &SharedLockState,
        interrupt: &Interrupt,
        observer: &dyn TaskObserver,
    ) -> Result<TaskOutcome, LockError> {
        let guard = lock.write(interrupt)?;
        let woke_waiter = guard.signal()?;
        self.emit(observer, TaskEvent::Signalled { woke_waiter });
        Ok(TaskOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::observer::RecordingObserver;
    use std::time::Duration;

    fn fast_settings() -> TaskSettings {
        TaskSettings {
            time_unit: Duration::from_millis(10),
            try_timeout_units: 5,
            wait_iterations: 2,
        }
    }

    #[test]
    fn test_name_is_upper_cased() {
        let task = LockTask::new(" reader-1 ", 3, TaskKind::Read);
        assert_eq!(task.name(), "READER-1");
        assert_eq!(task.duration_units(), 3);
        assert_eq!(task.kind(), TaskKind::Read);
    }

    #[test]
    fn test_read_task_emits_start_and_end() {
        let lock = SharedLockState::new();
        let observer = RecordingObserver::new();
        let task = LockTask::new("r", 1, TaskKind::Read);

        let outcome = task.execute(&lock, &Interrupt::new(), &fast_settings(), &observer);

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(outcome.state(), TaskState::Completed);
        assert_eq!(
            observer.events_for("R"),
            vec![TaskEvent::Started, TaskEvent::Finished]
        );
        assert_eq!(lock.read_holders(), 0);
    }

    #[test]
    fn test_interrupted_write_releases_lock() {
        let lock = SharedLockState::new();
        let observer = RecordingObserver::new();
        let interrupt = Interrupt::new();
        interrupt.interrupt();
        let task = LockTask::new("w", 1, TaskKind::Write);

        let outcome = task.execute(&lock, &interrupt, &fast_settings(), &observer);

        assert_eq!(outcome, TaskOutcome::Failed(LockError::Interrupted));
        assert_eq!(outcome.state(), TaskState::Failed);
        assert!(!lock.is_write_locked());
        let events = observer.events_for("W");
        assert_eq!(events[0], TaskEvent::Started);
        assert!(matches!(events.last(), Some(TaskEvent::Failed(_))));
    }

    #[test]
    fn test_signal_with_no_waiter() {
        let lock = SharedLockState::new();
        let observer = RecordingObserver::new();
        let task = LockTask::new("s", 0, TaskKind::Signal);

        let outcome = task.execute(&lock, &Interrupt::new(), &fast_settings(), &observer);

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(
            observer.events_for("S"),
            vec![TaskEvent::Signalled { woke_waiter: false }]
        );
        assert!(!lock.is_write_locked());
    }

    #[test]
    fn test_try_write_on_free_lock_completes() {
        let lock = SharedLockState::new();
        let observer = RecordingObserver::new();
        let task = LockTask::new("t", 0, TaskKind::TryWrite);

        let outcome = task.execute(&lock, &Interrupt::new(), &fast_settings(), &observer);

        assert_eq!(outcome, TaskOutcome::Completed);
        assert!(!lock.is_write_locked());
    }

    #[test]
    fn test_unavailable_maps_to_failed_state() {
        assert_eq!(TaskOutcome::LockUnavailable.state(), TaskState::Failed);
        assert_eq!(TaskState::Running.to_string(), "running");
    }
}
