use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::*;

use crossbeam_utils::Backoff;

/// Test-and-set lock serializing whole log lines across stdout and stderr.
pub(crate) struct SpinLock {
    locked: AtomicBool,
}

pub(crate) struct SpinGuard<'a> {
    lock: &'a SpinLock,
}

impl SpinLock {
    pub(crate) const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    pub(crate) fn lock(&self) -> SpinGuard<'_> {
        let backoff = Backoff::new();
        while self
            .locked
            .compare_exchange_weak(false, true, Acquire, Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
        SpinGuard { lock: self }
    }
}

impl Drop for SpinGuard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Release);
    }
}
