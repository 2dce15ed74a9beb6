use std::mem::MaybeUninit;
use std::ptr;

/// Local wall-clock time as `(hour, minute, second)`.
pub(crate) fn wall_clock() -> (i32, i32, i32) {
    let mut tm = MaybeUninit::<libc::tm>::zeroed();

    // SAFETY: `time` accepts a null output pointer, and `localtime_r` only
    // writes into the buffer we own. An all-zero `tm` is a valid value.
    let tm = unsafe {
        let now = libc::time(ptr::null_mut());
        libc::localtime_r(&now, tm.as_mut_ptr());
        tm.assume_init()
    };

    (tm.tm_hour, tm.tm_min, tm.tm_sec)
}

/// Kernel id of the calling thread.
#[cfg(target_os = "linux")]
pub(crate) fn thread_id() -> i64 {
    // SAFETY: `gettid` takes no arguments and cannot fail.
    unsafe { libc::syscall(libc::SYS_gettid) as i64 }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn thread_id() -> i64 {
    // SAFETY: `getpid` cannot fail.
    unsafe { libc::getpid() as i64 }
}
