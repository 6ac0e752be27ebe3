//! # Cooperative Interruption
//!
//! OS threads cannot be stopped from the outside, so every worker carries an
//! [`Interrupt`] token. Blocking operations poll it, and interruptible sleeps
//! wake as soon as it fires.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::errors::LockError;

/// Shared interruption flag for one worker thread.
///
/// Cloning is cheap; all clones observe the same flag. Once interrupted, a
/// token stays interrupted.
#[derive(Clone, Default)]
pub struct Interrupt {
    inner: Arc<InterruptInner>,
}

#[derive(Default)]
struct InterruptInner {
    interrupted: Mutex<bool>,
    wakeup: Condvar,
}

impl fmt::Debug for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interrupt")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the token interrupted and wake any thread sleeping on it.
    pub fn interrupt(&self) {
        let mut interrupted = self
            .inner
            .interrupted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *interrupted = true;
        self.inner.wakeup.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        *self
            .inner
            .interrupted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Return `Err(LockError::Interrupted)` if the token has fired.
    pub fn check(&self) -> Result<(), LockError> {
        if self.is_interrupted() {
            Err(LockError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration` unless interrupted first.
    ///
    /// A token that is already interrupted fails immediately, even for a zero
    /// duration. A duration too long to represent as an instant sleeps until
    /// interrupted.
    pub fn sleep(&self, duration: Duration) -> Result<(), LockError> {
        let deadline = Instant::now().checked_add(duration);
        let mut interrupted = self
            .inner
            .interrupted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if *interrupted {
                return Err(LockError::Interrupted);
            }
            interrupted = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    self.inner
                        .wakeup
                        .wait_timeout(interrupted, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .inner
                    .wakeup
                    .wait(interrupted)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}
