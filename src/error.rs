use std::fmt;
use std::io;

use thiserror::Error;

/// Errors returned by queue and log operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Generic failure: the operation could not complete right now.
    #[error("operation would block")]
    WouldBlock,
    /// A bounded wait elapsed before the queue became ready.
    #[error("timed out")]
    Timeout,
    /// A required argument was absent.
    #[error("null pointer")]
    NullPointer,
    /// Backing storage could not be obtained.
    #[error("memory allocation failed")]
    AllocationFailure,
    /// The queue is full and no wait is possible.
    #[error("cache overflow")]
    CacheOverflow,
    /// The handle is no longer valid.
    #[error("invalid entry")]
    InvalidEntry,
    /// A structurally invalid argument.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Numeric code of this error, compatible with C-style status returns.
    ///
    /// Every code is negative. [`Error::Io`] reports the negated errno, or
    /// `-1` when the error carries none.
    pub fn code(&self) -> i32 {
        match self {
            Self::WouldBlock => -1,
            Self::Timeout => -10000,
            Self::NullPointer => -10001,
            Self::AllocationFailure => -10002,
            Self::CacheOverflow => -10003,
            Self::InvalidEntry => -10004,
            Self::InvalidParameter(_) => -10005,
            Self::Io(e) => e.raw_os_error().map_or(-1, |errno| -errno),
        }
    }
}

/// A failed `put`, carrying the value that was not enqueued.
#[derive(Error)]
#[error("{error}")]
pub struct PutError<T> {
    pub error: Error,
    pub value: T,
}

impl<T> PutError<T> {
    pub(crate) fn new(error: Error, value: T) -> Self {
        Self { error, value }
    }

    /// Returns the rejected value.
    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn kind(&self) -> &Error {
        &self.error
    }
}

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> From<PutError<T>> for Error {
    fn from(err: PutError<T>) -> Self {
        err.error
    }
}
