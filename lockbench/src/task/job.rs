use std::fmt;
use std::sync::Arc;

use lockbench_api::{Interrupt, Job};
use tracing::debug;
use uuid::Uuid;

use crate::config::TaskSettings;
use crate::lock::SharedLockState;

use super::lock_task::{LockTask, TaskOutcome, TaskState};
use super::observer::TaskObserver;

/// Everything a task needs besides its own parameters, shared by every job
/// the harness creates.
#[derive(Clone)]
pub struct TaskContext {
    lock: Arc<SharedLockState>,
    settings: Arc<TaskSettings>,
    observer: Arc<dyn TaskObserver>,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("lock", &self.lock)
            .field("settings", &self.settings)
            .finish()
    }
}

impl TaskContext {
    pub fn new(
        lock: Arc<SharedLockState>,
        settings: TaskSettings,
        observer: Arc<dyn TaskObserver>,
    ) -> Self {
        Self {
            lock,
            settings: Arc::new(settings),
            observer,
        }
    }

    pub fn lock(&self) -> &Arc<SharedLockState> {
        &self.lock
    }

    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    /// Wrap `task` into a job ready for submission.
    pub fn job(&self, task: LockTask) -> LockJob {
        LockJob::new(task, self.clone())
    }
}

/// A [`LockTask`] bound to the shared lock, ready to run on a pool worker.
pub struct LockJob {
    id: Uuid,
    task: LockTask,
    context: TaskContext,
}

impl fmt::Debug for LockJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockJob")
            .field("id", &self.id)
            .field("task", &self.task)
            .finish()
    }
}

impl LockJob {
    pub fn new(task: LockTask, context: TaskContext) -> Self {
        let id = Uuid::new_v4();
        debug!(
            task_id = %id,
            task = %task.name(),
            kind = %task.kind(),
            family = %task.kind().family(),
            state = %TaskState::Created
        );
        Self { id, task, context }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn task(&self) -> &LockTask {
        &self.task
    }

    /// Execute on the calling thread and return the outcome.
    pub fn execute(&self, interrupt: &Interrupt) -> TaskOutcome {
        let span = crate::task_span!(self.id, self.task.name(), self.task.kind());
        let _enter = span.enter();

        debug!(state = %TaskState::Running, duration_units = self.task.duration_units());
        let outcome = self.task.execute(
            &self.context.lock,
            interrupt,
            &self.context.settings,
            self.context.observer.as_ref(),
        );
        debug!(state = %outcome.state(), outcome = ?outcome);
        outcome
    }
}

impl Job for LockJob {
    fn name(&self) -> &str {
        self.task.name()
    }

    fn run(self: Box<Self>, interrupt: &Interrupt) {
        self.execute(interrupt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::kind::TaskKind;
    use crate::task::observer::{RecordingObserver, TaskEvent};
    use std::time::Duration;

    #[test]
    fn test_job_runs_task_against_shared_lock() {
        let observer = Arc::new(RecordingObserver::new());
        let settings = TaskSettings {
            time_unit: Duration::from_millis(5),
            ..Default::default()
        };
        let context = TaskContext::new(Arc::new(SharedLockState::new()), settings, observer.clone());

        let job = context.job(LockTask::new("a", 1, TaskKind::Write));
        assert_eq!(Job::name(&job), "A");

        Box::new(job).run(&Interrupt::new());

        assert_eq!(
            observer.events_for("A"),
            vec![TaskEvent::Started, TaskEvent::Finished]
        );
        assert!(!context.lock().is_write_locked());
    }

    #[test]
    fn test_jobs_get_distinct_ids() {
        let context = TaskContext::new(
            Arc::new(SharedLockState::new()),
            TaskSettings::default(),
            Arc::new(RecordingObserver::new()),
        );
        let first = context.job(LockTask::new("x", 0, TaskKind::Read));
        let second = context.job(LockTask::new("x", 0, TaskKind::Read));
        assert_ne!(first.id(), second.id());
    }
}
