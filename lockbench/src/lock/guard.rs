use std::marker::PhantomData;

use lockbench_api::{Interrupt, LockError};
use tracing::error;

use super::state::SharedLockState;

/// Shared acquisition released on drop, on every exit path.
///
/// Not `Send`: ownership is tracked per thread, so the guard must be dropped
/// on the thread that acquired it.
#[must_use = "the read lock is released as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    lock: &'a SharedLockState,
    _not_send: PhantomData<*const ()>,
}

impl<'a> ReadGuard<'a> {
    pub(super) fn new(lock: &'a SharedLockState) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release_read() {
            error!(error = %e, "failed to release read lock");
        }
    }
}

/// Exclusive acquisition released on drop, on every exit path.
///
/// Also the only handle through which the condition can be used, which keeps
/// `await`/`signal` confined to write-lock holders.
#[must_use = "the write lock is released as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    lock: &'a SharedLockState,
    _not_send: PhantomData<*const ()>,
}

impl<'a> WriteGuard<'a> {
    pub(super) fn new(lock: &'a SharedLockState) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }

    /// See [`SharedLockState::await_signal`]. The guard still owns the write
    /// lock afterwards, whether or not the await was interrupted.
    pub fn await_signal(&mut self, interrupt: &Interrupt) -> Result<(), LockError> {
        self.lock.await_signal(interrupt)
    }

    /// See [`SharedLockState::signal`].
    pub fn signal(&self) -> Result<bool, LockError> {
        self.lock.signal()
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release_write() {
            error!(error = %e, "failed to release write lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_guards_release_on_drop() {
        let lock = SharedLockState::new();
        let interrupt = Interrupt::new();
        {
            let _first = lock.read(&interrupt).unwrap();
            let _second = lock.read(&interrupt).unwrap();
            assert_eq!(lock.read_holders(), 2);
        }
        assert_eq!(lock.read_holders(), 0);

        {
            let _guard = lock.write(&interrupt).unwrap();
            assert!(lock.is_write_locked());
        }
        assert!(!lock.is_write_locked());
    }

    #[test]
    fn test_write_guard_released_on_panic() {
        let lock = SharedLockState::new();
        let interrupt = Interrupt::new();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = lock.write(&interrupt).unwrap();
            panic!("task blew up while holding the lock");
        }));

        assert!(result.is_err());
        assert!(!lock.is_write_locked());
    }

    #[test]
    fn test_try_write_guard() {
        let lock = SharedLockState::new();
        let interrupt = Interrupt::new();
        let guard = lock
            .try_write(std::time::Duration::from_millis(10), &interrupt)
            .unwrap();
        assert!(guard.is_some());
        drop(guard);
        assert!(!lock.is_write_locked());
    }
}
