use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::ring::Ring;
use super::{Mode, Queue};
use crate::trace::debug;
use crate::{Error, PutError, Timeout};

/// Synchronized bounded queue.
///
/// Producers park on `not_full` while every slot is taken and consumers park
/// on `not_empty` while no slot is. Each successful transfer wakes one waiter
/// on the opposite side. Share it between threads with an `Arc`.
pub struct Shared<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

struct State<T> {
    ring: Ring<T>,
    closed: bool,
}

impl<T> Shared<T> {
    /// Creates a queue of `capacity` slots.
    pub fn create(capacity: u16) -> Result<Self, Error> {
        Ok(Self {
            state: Mutex::new(State {
                ring: Ring::with_capacity(capacity)?,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: usize::from(capacity),
        })
    }

    /// The ring is consistent between statements, so a panic in another
    /// holder leaves nothing to repair.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits on `cond` while `blocked` holds, within `timeout`.
    ///
    /// The predicate is rechecked after every wakeup, spurious or not.
    fn wait_while<'a>(
        &self,
        mut state: MutexGuard<'a, State<T>>,
        cond: &Condvar,
        timeout: Timeout,
        blocked: impl Fn(&Ring<T>) -> bool,
    ) -> Result<MutexGuard<'a, State<T>>, Error> {
        let timeout = timeout.normalize();
        let deadline = timeout.deadline(Instant::now());

        loop {
            if state.closed {
                return Err(Error::InvalidEntry);
            }
            if !blocked(&state.ring) {
                return Ok(state);
            }

            state = match (timeout, deadline) {
                (Timeout::None, _) => return Err(Error::WouldBlock),
                (_, Some(deadline)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!("wait timed out after {:?}", timeout);
                        return Err(Error::Timeout);
                    }
                    cond.wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                // Infinite, or a duration past the end of the clock.
                (_, None) => cond.wait(state).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }
}

impl<T> Queue<T> for Shared<T> {
    fn put(&self, value: T, timeout: Timeout) -> Result<(), PutError<T>> {
        let state = self.lock();
        let mut state = match self.wait_while(state, &self.not_full, timeout, Ring::is_full) {
            Ok(state) => state,
            Err(e) => return Err(PutError::new(e, value)),
        };

        if let Err(value) = state.ring.push(value) {
            return Err(PutError::new(Error::CacheOverflow, value));
        }
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    fn get(&self, timeout: Timeout) -> Result<T, Error> {
        let state = self.lock();
        let mut state = self.wait_while(state, &self.not_empty, timeout, Ring::is_empty)?;

        let value = state.ring.pop().ok_or(Error::WouldBlock)?;
        drop(state);

        self.not_full.notify_one();
        Ok(value)
    }

    fn reset(&self) -> Result<(), Error> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::InvalidEntry);
        }
        state.ring.clear();
        drop(state);

        // Every slot is free now; release all blocked producers.
        self.not_full.notify_all();
        Ok(())
    }

    fn destroy(&self) -> Result<(), Error> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::InvalidEntry);
        }
        state.closed = true;
        state.ring.clear();
        drop(state);

        debug!("queue destroyed, waking all waiters");
        self.not_empty.notify_all();
        self.not_full.notify_all();
        Ok(())
    }

    fn len(&self) -> usize {
        self.lock().ring.len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn mode(&self) -> Mode {
        Mode::Synchronized
    }
}

impl<T> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Shared")
            .field("len", &state.ring.len())
            .field("capacity", &self.capacity)
            .field("closed", &state.closed)
            .finish()
    }
}
