//! Bounded FIFO queues.
//!
//! Two flavours share one circular buffer:
//!
//! * [`Local`] has no internal locking. It is `Send` but not `Sync`, so the
//!   single-owner requirement is checked by the compiler. A full queue fails
//!   a `put` immediately with [`Error::CacheOverflow`].
//! * [`Shared`] guards the buffer with a mutex and parks producers and
//!   consumers on two condition variables, honoring a [`Timeout`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use easy_queue::queue::{Queue, Shared};
//! use easy_queue::Timeout;
//!
//! let q = Arc::new(Shared::create(4).unwrap());
//!
//! let producer = {
//!     let q = q.clone();
//!     thread::spawn(move || {
//!         for i in 0..10 {
//!             q.put(i, Timeout::Infinite).unwrap();
//!         }
//!     })
//! };
//!
//! for i in 0..10 {
//!     assert_eq!(q.get(Timeout::Infinite).unwrap(), i);
//! }
//! producer.join().unwrap();
//! ```

use crate::{Error, PutError, Timeout};

mod local;
mod ring;
mod shared;

pub use local::Local;
pub use shared::Shared;

/// Whether a queue synchronizes access internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No locking; the caller provides any coordination.
    Unsynchronized,
    /// Mutex and condition variables; blocking `put`/`get`.
    Synchronized,
}

pub trait Queue<T> {
    /// Appends `value`, waiting up to `timeout` for a free slot.
    ///
    /// On failure the value is handed back inside the error.
    fn put(&self, value: T, timeout: Timeout) -> Result<(), PutError<T>>;

    /// Removes the oldest value, waiting up to `timeout` for one to arrive.
    fn get(&self, timeout: Timeout) -> Result<T, Error>;

    /// Drops every queued value and rewinds the cursors.
    fn reset(&self) -> Result<(), Error>;

    /// Invalidates the queue. Later calls fail with [`Error::InvalidEntry`].
    fn destroy(&self) -> Result<(), Error>;

    fn len(&self) -> usize;

    fn capacity(&self) -> usize;

    fn mode(&self) -> Mode;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// The remaining capacity.
    fn slack(&self) -> usize {
        self.capacity() - self.len()
    }
}

/// Creates a queue of `capacity` slots operating in `mode`.
///
/// Use [`Shared::create`] directly when the queue must cross threads.
///
/// # Errors
///
/// [`Error::InvalidParameter`] if `capacity` is zero,
/// [`Error::AllocationFailure`] if the slots cannot be allocated.
pub fn create<T: 'static>(capacity: u16, mode: Mode) -> Result<Box<dyn Queue<T>>, Error> {
    let queue: Box<dyn Queue<T>> = match mode {
        Mode::Unsynchronized => Box::new(Local::create(capacity)?),
        Mode::Synchronized => Box::new(Shared::create(capacity)?),
    };
    Ok(queue)
}
