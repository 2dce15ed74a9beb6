//! The control pipe and the thread reading commands from it.
//!
//! The reader blocks in `open` until a writer shows up, reads one chunk,
//! closes the pipe and starts over. Reopening each time keeps the thread
//! parked instead of spinning on end-of-file.

use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering::*;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use super::{Inner, Level};
use crate::trace::{debug, warn};
use crate::Error;

/// Bytes taken from the pipe per read.
const READ_BUF_SIZE: usize = 1024;

/// Most tokens accepted on one command line.
const MAX_TOKENS: usize = 32;

const CMD_LOG_LEVEL: &str = "loglevel";

const FIFO_MODE: libc::mode_t = 0o666;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

const STOP_POLLS: usize = 30;

const RUNNING: u8 = 0;
const EXITING: u8 = 1;
const EXITED: u8 = 2;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    SetLevel(Level),
}

#[derive(Debug, PartialEq, Eq, Error)]
pub(crate) enum CommandError {
    #[error("the number of tokens exceeded")]
    TooManyTokens,
    #[error("incomplete command: [ {0} ]")]
    Incomplete(String),
    #[error("invalid cmd: [ {0} ]")]
    Invalid(String),
}

/// Parses one line written into the pipe. Blank lines yield `None`.
pub(crate) fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() > MAX_TOKENS {
        return Err(CommandError::TooManyTokens);
    }

    match tokens.as_slice() {
        [] => Ok(None),
        [CMD_LOG_LEVEL] => Err(CommandError::Incomplete(line.trim().to_owned())),
        [CMD_LOG_LEVEL, level, ..] => level
            .parse()
            .map(|lv| Some(Command::SetLevel(lv)))
            .map_err(|_| CommandError::Invalid((*level).to_owned())),
        [cmd, ..] => Err(CommandError::Invalid((*cmd).to_owned())),
    }
}

fn apply(line: &str, inner: &Inner) {
    match parse(line) {
        Ok(Some(Command::SetLevel(level))) => {
            debug!("log level set to {}", level);
            inner.set_level(level);
        }
        Ok(None) => {}
        Err(e) => {
            inner.print(
                Level::Warn,
                module_path!(),
                file!(),
                line!(),
                format_args!("{}", e),
            );
        }
    }
}

/// Replaces whatever is at `path` with a fresh FIFO.
pub(crate) fn create_fifo(path: &Path) -> io::Result<()> {
    remove_fifo(path)?;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: `c_path` is a valid NUL-terminated string for the whole call.
    if unsafe { libc::mkfifo(c_path.as_ptr(), FIFO_MODE) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Removes `path` if it exists.
pub(crate) fn remove_fifo(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Unblocks a reader parked in `open`. Fails with `ENXIO` while no reader
/// has the pipe open.
fn wake(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
        .map(drop)
}

pub(crate) struct Reader {
    handle: JoinHandle<()>,
    state: Arc<AtomicU8>,
    path: PathBuf,
}

impl Reader {
    /// Creates the FIFO at `path` and starts the reader thread.
    pub(crate) fn spawn(path: PathBuf, inner: Arc<Inner>) -> Result<Self, Error> {
        create_fifo(&path)?;

        let state = Arc::new(AtomicU8::new(RUNNING));
        let spawned = {
            let state = state.clone();
            let path = path.clone();
            thread::Builder::new()
                .name("log-pipe".into())
                .spawn(move || run(&path, &state, &inner))
        };

        match spawned {
            Ok(handle) => Ok(Self {
                handle,
                state,
                path,
            }),
            Err(e) => {
                let _ = remove_fifo(&path);
                Err(e.into())
            }
        }
    }

    /// Asks the thread to exit, joins it and removes the FIFO.
    ///
    /// A thread that does not respond within the polling window is detached.
    pub(crate) fn stop(self, inner: &Inner) {
        let _ = self.state.compare_exchange(RUNNING, EXITING, AcqRel, Acquire);

        let mut exited = false;
        for _ in 0..STOP_POLLS {
            if self.state.load(Acquire) == EXITED {
                exited = true;
                break;
            }
            let _ = wake(&self.path);
            thread::sleep(STOP_POLL_INTERVAL);
        }

        if exited || self.handle.is_finished() {
            if self.handle.join().is_err() {
                inner.print(
                    Level::Error,
                    module_path!(),
                    file!(),
                    line!(),
                    format_args!("log pipe thread panicked"),
                );
            }
        } else {
            inner.print(
                Level::Warn,
                module_path!(),
                file!(),
                line!(),
                format_args!("log pipe thread did not exit, detaching"),
            );
        }

        if let Err(e) = remove_fifo(&self.path) {
            inner.print(
                Level::Error,
                module_path!(),
                file!(),
                line!(),
                format_args!("remove [{}]: {}", self.path.display(), e),
            );
        }
    }
}

/// Marks the reader as exited however the thread ends.
struct ExitGuard<'a>(&'a AtomicU8);

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(EXITED, Release);
    }
}

fn run(path: &Path, state: &AtomicU8, inner: &Inner) {
    let _guard = ExitGuard(state);
    let mut buf = [0u8; READ_BUF_SIZE];

    debug!("log pipe reader listening on {}", path.display());

    loop {
        let mut pipe = match File::open(path) {
            Ok(pipe) => pipe,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("log pipe reader exiting: {}", e);
                inner.print(
                    Level::Error,
                    module_path!(),
                    file!(),
                    line!(),
                    format_args!("open [{}]: {}", path.display(), e),
                );
                return;
            }
        };

        // An interrupted or failed read counts as end-of-file.
        let n = pipe.read(&mut buf).unwrap_or(0);
        drop(pipe);

        if state.load(Acquire) == EXITING {
            debug!("log pipe reader stopping");
            return;
        }

        if n > 0 {
            let text = String::from_utf8_lossy(&buf[..n]);
            for line in text.lines() {
                apply(line, inner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_level() {
        assert_eq!(
            parse("loglevel 5\n"),
            Ok(Some(Command::SetLevel(Level::Debug1)))
        );
        assert_eq!(
            parse("  loglevel   0"),
            Ok(Some(Command::SetLevel(Level::Off)))
        );
    }

    #[test]
    fn blank() {
        assert_eq!(parse(""), Ok(None));
        assert_eq!(parse(" \n"), Ok(None));
    }

    #[test]
    fn out_of_range() {
        assert_eq!(
            parse("loglevel 8"),
            Err(CommandError::Invalid("8".to_owned()))
        );
        assert_eq!(
            parse("loglevel -1"),
            Err(CommandError::Invalid("-1".to_owned()))
        );
        assert_eq!(
            parse("loglevel high"),
            Err(CommandError::Invalid("high".to_owned()))
        );
    }

    #[test]
    fn incomplete() {
        assert!(matches!(
            parse("loglevel\n"),
            Err(CommandError::Incomplete(_))
        ));
    }

    #[test]
    fn unknown() {
        assert_eq!(
            parse("verbose 3"),
            Err(CommandError::Invalid("verbose".to_owned()))
        );
    }

    #[test]
    fn token_limit() {
        let ok = format!("loglevel 3{}", " x".repeat(MAX_TOKENS - 2));
        assert_eq!(parse(&ok), Ok(Some(Command::SetLevel(Level::Warn))));

        let too_many = format!("loglevel 3{}", " x".repeat(MAX_TOKENS - 1));
        assert_eq!(parse(&too_many), Err(CommandError::TooManyTokens));
    }

    #[test]
    fn apply_ignores_bad_commands() {
        let inner = Inner::new(Level::Off);

        apply("loglevel 6", &inner);
        assert_eq!(inner.level(), Level::Debug2);

        apply("loglevel 99", &inner);
        apply("nonsense", &inner);
        assert_eq!(inner.level(), Level::Debug2);
    }
}
