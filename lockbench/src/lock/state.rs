use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use lockbench_api::{Interrupt, LockError};
use tracing::trace;

use super::guard::{ReadGuard, WriteGuard};

/// Longest a blocked caller sleeps before re-checking its interrupt token.
pub const INTERRUPT_POLL: Duration = Duration::from_millis(20);

// LockState can be in the following shapes:
//
// 1. no readers, no writer: anyone can acquire anything (initial state)
// 2. 1+ readers, no writer: new readers admitted unless a writer is queued
// 3. no readers, writer: only the writer thread may re-enter
//
// Condition waiters hold neither; they sit in `condition_queue` until a
// signal moves their ticket into `signaled`, then queue for the write lock.
#[derive(Default)]
struct LockState {
    readers: HashMap<ThreadId, usize>,
    writer: Option<ThreadId>,
    write_holds: usize,
    waiting_writers: usize,
    condition_queue: VecDeque<u64>,
    signaled: HashSet<u64>,
    next_ticket: u64,
}

impl LockState {
    fn is_free(&self) -> bool {
        self.writer.is_none() && self.readers.is_empty()
    }

    fn admits_reader(&self, me: ThreadId) -> bool {
        self.writer.is_none() && (self.waiting_writers == 0 || self.readers.contains_key(&me))
    }

    fn read_holders(&self) -> usize {
        self.readers.values().sum()
    }
}

/// One reader-writer lock plus one condition bound to its write side.
///
/// Created once and shared by every task through an `Arc`. All blocking
/// operations take the calling worker's [`Interrupt`] and give up with
/// [`LockError::Interrupted`] once it fires.
///
/// Fairness between readers and writers is not guaranteed. New readers defer
/// to queued writers unless they already hold a read acquisition.
pub struct SharedLockState {
    state: Mutex<LockState>,
    /// Signalled whenever readers or the writer leave.
    lock_changed: Condvar,
    /// Signalled whenever a condition waiter is chosen.
    condition: Condvar,
}

impl Default for SharedLockState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedLockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("SharedLockState")
            .field("read_holders", &state.read_holders())
            .field("write_locked", &state.writer.is_some())
            .field("waiting_writers", &state.waiting_writers)
            .field("condition_waiters", &state.condition_queue.len())
            .finish()
    }
}

impl SharedLockState {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            lock_changed: Condvar::new(),
            condition: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_lock_changed<'a>(
        &self,
        state: MutexGuard<'a, LockState>,
        slice: Duration,
    ) -> MutexGuard<'a, LockState> {
        self.lock_changed
            .wait_timeout(state, slice)
            .unwrap_or_else(PoisonError::into_inner)
            .0
    }

    // --- Read side ---

    /// Block until no writer holds (or is queued for) the lock, then take a
    /// shared acquisition.
    pub fn acquire_read(&self, interrupt: &Interrupt) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state();

        if state.writer == Some(me) {
            return Err(LockError::IllegalState(
                "read requested while holding the write lock".to_string(),
            ));
        }

        loop {
            if state.admits_reader(me) {
                *state.readers.entry(me).or_default() += 1;
                trace!(readers = state.read_holders(), "read lock acquired");
                return Ok(());
            }
            interrupt.check()?;
            state = self.wait_lock_changed(state, INTERRUPT_POLL);
        }
    }

    /// Drop one shared acquisition held by the calling thread.
    pub fn release_read(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state();

        let remaining = match state.readers.get_mut(&me) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => {
                return Err(LockError::IllegalState(
                    "read lock released without a matching acquire".to_string(),
                ));
            }
        };
        if remaining == 0 {
            state.readers.remove(&me);
        }
        trace!(readers = state.read_holders(), "read lock released");
        if state.readers.is_empty() {
            self.lock_changed.notify_all();
        }
        Ok(())
    }

    // --- Write side ---

    /// Block until no reader and no other writer holds the lock.
    ///
    /// Re-entrant for the thread that already holds the write lock.
    pub fn acquire_write(&self, interrupt: &Interrupt) -> Result<(), LockError> {
        self.acquire_write_until(None, interrupt).map(|_| ())
    }

    /// Try for exclusive access, blocking at most `timeout`.
    ///
    /// Returns `Ok(false)` when the timeout elapses; only interruption or
    /// misuse produce an error. A timeout too long to represent as an instant
    /// waits like [`acquire_write`](Self::acquire_write).
    pub fn try_acquire_write(
        &self,
        timeout: Duration,
        interrupt: &Interrupt,
    ) -> Result<bool, LockError> {
        self.acquire_write_until(Instant::now().checked_add(timeout), interrupt)
    }

    fn acquire_write_until(
        &self,
        deadline: Option<Instant>,
        interrupt: &Interrupt,
    ) -> Result<bool, LockError> {
        let me = thread::current().id();
        let mut state = self.state();

        if state.writer == Some(me) {
            state.write_holds += 1;
            return Ok(true);
        }
        if state.readers.contains_key(&me) {
            return Err(LockError::IllegalState(
                "write requested while holding a read lock".to_string(),
            ));
        }

        state.waiting_writers += 1;
        loop {
            if state.is_free() {
                state.waiting_writers -= 1;
                state.writer = Some(me);
                state.write_holds = 1;
                trace!("write lock acquired");
                return Ok(true);
            }

            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.abandon_write_wait(&mut state);
                        return Ok(false);
                    }
                    (deadline - now).min(INTERRUPT_POLL)
                }
                None => INTERRUPT_POLL,
            };

            if interrupt.is_interrupted() {
                self.abandon_write_wait(&mut state);
                return Err(LockError::Interrupted);
            }

            state = self.wait_lock_changed(state, slice);
        }
    }

    // Readers held back by our queued request may proceed now.
    fn abandon_write_wait(&self, state: &mut LockState) {
        state.waiting_writers -= 1;
        self.lock_changed.notify_all();
    }

    /// Drop one exclusive acquisition held by the calling thread.
    pub fn release_write(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state();

        if state.writer != Some(me) {
            return Err(LockError::IllegalState(
                "write lock released by a thread that does not hold it".to_string(),
            ));
        }
        state.write_holds -= 1;
        if state.write_holds == 0 {
            state.writer = None;
            trace!("write lock released");
            self.lock_changed.notify_all();
        }
        Ok(())
    }

    // --- Condition ---

    /// Atomically release the write lock and suspend until signalled, then
    /// re-acquire the write lock before returning.
    ///
    /// There is no timeout: without a signal the caller stays suspended until
    /// its interrupt fires. Even an interrupted await returns holding the
    /// write lock, so the caller's release discipline stays uniform.
    pub fn await_signal(&self, interrupt: &Interrupt) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state();

        if state.writer != Some(me) {
            return Err(LockError::IllegalState(
                "await called without holding the write lock".to_string(),
            ));
        }

        let holds = state.write_holds;
        state.writer = None;
        state.write_holds = 0;
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.condition_queue.push_back(ticket);
        self.lock_changed.notify_all();
        trace!(ticket, "awaiting signal");

        let mut interrupted = false;
        loop {
            if state.signaled.remove(&ticket) {
                break;
            }
            if interrupt.is_interrupted() {
                state.condition_queue.retain(|waiting| *waiting != ticket);
                interrupted = true;
                break;
            }
            state = self
                .condition
                .wait_timeout(state, INTERRUPT_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        state.waiting_writers += 1;
        while !state.is_free() {
            state = self
                .lock_changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.waiting_writers -= 1;
        state.writer = Some(me);
        state.write_holds = holds;
        trace!(ticket, interrupted, "write lock re-acquired after await");

        if interrupted {
            Err(LockError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Wake the longest-waiting thread suspended in [`await_signal`], if any.
    ///
    /// Returns whether a waiter was chosen; zero waiters is not an error.
    ///
    /// [`await_signal`]: SharedLockState::await_signal
    pub fn signal(&self) -> Result<bool, LockError> {
        let me = thread::current().id();
        let mut state = self.state();

        if state.writer != Some(me) {
            return Err(LockError::IllegalState(
                "signal called without holding the write lock".to_string(),
            ));
        }

        match state.condition_queue.pop_front() {
            Some(ticket) => {
                state.signaled.insert(ticket);
                self.condition.notify_all();
                trace!(ticket, "signalled condition waiter");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- Scoped acquisition ---

    /// Acquire a read lock released when the guard drops.
    pub fn read(&self, interrupt: &Interrupt) -> Result<ReadGuard<'_>, LockError> {
        self.acquire_read(interrupt)?;
        Ok(ReadGuard::new(self))
    }

    /// Acquire the write lock, released when the guard drops.
    pub fn write(&self, interrupt: &Interrupt) -> Result<WriteGuard<'_>, LockError> {
        self.acquire_write(interrupt)?;
        Ok(WriteGuard::new(self))
    }

    /// Timed write acquisition; `Ok(None)` when the timeout elapsed.
    pub fn try_write(
        &self,
        timeout: Duration,
        interrupt: &Interrupt,
    ) -> Result<Option<WriteGuard<'_>>, LockError> {
        Ok(self
            .try_acquire_write(timeout, interrupt)?
            .then(|| WriteGuard::new(self)))
    }

    // --- Introspection ---

    /// Total read acquisitions currently held, counting re-entries.
    pub fn read_holders(&self) -> usize {
        self.state().read_holders()
    }

    pub fn is_write_locked(&self) -> bool {
        self.state().writer.is_some()
    }

    /// Threads suspended in `await_signal` that have not been signalled yet.
    pub fn condition_waiters(&self) -> usize {
        self.state().condition_queue.len()
    }

    pub fn waiting_writers(&self) -> usize {
        self.state().waiting_writers
    }
}
