use std::cell::{Cell, RefCell};
use std::fmt;

use super::ring::Ring;
use super::{Mode, Queue};
use crate::{Error, PutError, Timeout};

/// Unsynchronized bounded queue.
///
/// Never blocks: there is nothing to wait on, so the timeout passed to
/// [`put`](Queue::put) and [`get`](Queue::get) is ignored.
pub struct Local<T> {
    ring: RefCell<Ring<T>>,
    destroyed: Cell<bool>,
}

impl<T> Local<T> {
    /// Creates a queue of `capacity` slots.
    ///
    /// # Examples
    ///
    /// ```
    /// use easy_queue::queue::{Local, Queue};
    /// use easy_queue::{Error, Timeout};
    ///
    /// let q = Local::create(1).unwrap();
    /// q.put('a', Timeout::None).unwrap();
    /// assert!(matches!(q.put('b', Timeout::None).unwrap_err().kind(), Error::CacheOverflow));
    /// ```
    pub fn create(capacity: u16) -> Result<Self, Error> {
        Ok(Self {
            ring: RefCell::new(Ring::with_capacity(capacity)?),
            destroyed: Cell::new(false),
        })
    }

    fn check(&self) -> Result<(), Error> {
        if self.destroyed.get() {
            return Err(Error::InvalidEntry);
        }
        Ok(())
    }
}

impl<T> Queue<T> for Local<T> {
    fn put(&self, value: T, _timeout: Timeout) -> Result<(), PutError<T>> {
        if let Err(e) = self.check() {
            return Err(PutError::new(e, value));
        }

        self.ring
            .borrow_mut()
            .push(value)
            .map_err(|value| PutError::new(Error::CacheOverflow, value))
    }

    fn get(&self, _timeout: Timeout) -> Result<T, Error> {
        self.check()?;
        self.ring.borrow_mut().pop().ok_or(Error::WouldBlock)
    }

    fn reset(&self) -> Result<(), Error> {
        self.check()?;
        self.ring.borrow_mut().clear();
        Ok(())
    }

    fn destroy(&self) -> Result<(), Error> {
        self.check()?;
        self.destroyed.set(true);
        self.ring.borrow_mut().clear();
        Ok(())
    }

    #[inline]
    fn len(&self) -> usize {
        self.ring.borrow().len()
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.ring.borrow().capacity()
    }

    #[inline]
    fn mode(&self) -> Mode {
        Mode::Unsynchronized
    }
}

impl<T> fmt::Debug for Local<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Local")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
