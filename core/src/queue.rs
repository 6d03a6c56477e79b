//! Bounded, blocking, closeable FIFO shared between threads.
//!
//! # Design
//! One `Mutex` guards the items and the running flag. Two condition
//! variables signal the two directions: `not_full` wakes producers when a
//! slot frees, `not_empty` wakes consumers when an item arrives. Closing the
//! queue flips the flag under the lock and then wakes every waiter on both
//! conditions; waiters re-check the flag before sleeping again, so every
//! current and future caller observes the close without any bound on how many
//! threads may be waiting.
//!
//! `pop` reports why it returned empty-handed (`TimedOut` vs `Closed`) so
//! worker loops can exit on close instead of spinning.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::SmqError;

/// Outcome of a `pop`.
#[derive(Debug, PartialEq, Eq)]
pub enum Pop<T> {
    /// The head of the queue.
    Item(T),
    /// The deadline passed while the queue was empty and still running.
    TimedOut,
    /// The queue was shut down and holds no more items.
    Closed,
}

impl<T> Pop<T> {
    pub fn into_item(self) -> Option<T> {
        match self {
            Pop::Item(item) => Some(item),
            Pop::TimedOut | Pop::Closed => None,
        }
    }
}

/// Returned by `push` on a closed queue; carries the rejected item back.
#[derive(PartialEq, Eq)]
pub struct Closed<T>(pub T);

impl<T> fmt::Debug for Closed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Closed(..)")
    }
}

impl<T> fmt::Display for Closed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue is shut down")
    }
}

impl<T> std::error::Error for Closed<T> {}

struct State<T> {
    items: VecDeque<T>,
    running: bool,
}

/// Fixed-capacity FIFO shared between threads. `push` blocks while full and
/// `pop` waits up to a deadline; `shutdown` releases every waiter.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Create an empty, running queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Result<Self, SmqError> {
        if capacity == 0 {
            return Err(SmqError::Config("queue capacity must be at least 1".to_string()));
        }
        Ok(Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity.min(1024)),
                running: true,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        })
    }

    // A panic while holding the lock cannot leave `State` half-updated: every
    // mutation is a single push/pop/flag store.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append `item`, blocking while the queue is full.
    ///
    /// If the queue is shut down before a slot frees, the item is not
    /// enqueued and comes back inside `Closed`.
    pub fn push(&self, item: T) -> Result<(), Closed<T>> {
        let mut state = self.lock();
        while state.running && state.items.len() >= self.capacity {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if !state.running {
            return Err(Closed(item));
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove and return the head, waiting at most `timeout` for one.
    ///
    /// The deadline is fixed at entry; spurious wakeups do not extend it.
    /// Items enqueued before `shutdown` are still returned as `Pop::Item`.
    pub fn pop(&self, timeout: Duration) -> Pop<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Pop::Item(item);
            }
            if !state.running {
                return Pop::Closed;
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                // Overflowing deadline: wait in large steps forever.
                None => Duration::from_secs(u32::MAX as u64),
            };
            if remaining.is_zero() {
                return Pop::TimedOut;
            }
            state = match self.not_empty.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Non-blocking `pop`: `TimedOut` means empty but still running.
    pub fn try_pop(&self) -> Pop<T> {
        self.pop(Duration::ZERO)
    }

    /// Stop accepting items and wake every blocked `push` and `pop`.
    ///
    /// Queued items are kept and remain poppable. Calling this more than
    /// once is harmless.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.running = false;
        drop(state);
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &state.items.len())
            .field("running", &state.running)
            .finish()
    }
}
