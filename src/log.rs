//! Level-gated logging whose level can be changed at runtime through a
//! named pipe.
//!
//! [`LogContext::init`] creates the pipe and starts a reader thread. Writing
//! a command into the pipe adjusts the context while the program runs:
//!
//! ```text
//! echo loglevel 7 > /tmp/easy_queue_log
//! ```
//!
//! Valid levels are `0..=7`, see [`Level`].

use std::env;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering::*;
use std::sync::Arc;

use crate::Error;

mod clock;
mod pipe;
mod spin;

use pipe::Reader;
use spin::SpinLock;

const DEFAULT_LEVEL: Level = Level::Info;

const DEFAULT_PIPE: &str = "/tmp/easy_queue_log";

const ENV_LEVEL_NAME: &str = "EASY_QUEUE_LOG_LEVEL";

const ENV_PIPE_NAME: &str = "EASY_QUEUE_LOG_PIPE";

/// Longest accepted pipe path, in bytes.
const MAX_PIPE_PATH: usize = 256;

const COLOR_NONE: &str = "\x1b[m";
const COLOR_RED: &str = "\x1b[0;32;31m";
const COLOR_GREEN: &str = "\x1b[0;32;32m";
const COLOR_YELLOW: &str = "\x1b[1;33m";

/// Verbosity of a log line. A line is printed when its level does not exceed
/// the context's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    /// Nothing is printed.
    Off = 0,
    Default = 1,
    Error = 2,
    Warn = 3,
    Info = 4,
    Debug1 = 5,
    Debug2 = 6,
    Debug3 = 7,
}

impl Level {
    pub const MAX: Level = Level::Debug3;

    fn tag(self) -> &'static str {
        match self {
            Self::Off => "",
            Self::Default => "prnt",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug1 | Self::Debug2 | Self::Debug3 => "debg",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Error => COLOR_RED,
            Self::Warn => COLOR_YELLOW,
            Self::Info => COLOR_GREEN,
            _ => COLOR_NONE,
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Self::Error | Self::Warn)
    }
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        Ok(match value {
            0 => Self::Off,
            1 => Self::Default,
            2 => Self::Error,
            3 => Self::Warn,
            4 => Self::Info,
            5 => Self::Debug1,
            6 => Self::Debug2,
            7 => Self::Debug3,
            _ => return Err(Error::InvalidParameter("log level out of range")),
        })
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidParameter("log level is not a number"))?;
        Self::try_from(value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Settings for [`LogContext::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Initial level.
    pub level: Level,
    /// Where the control pipe is created. A stale file at this path is
    /// replaced.
    pub pipe: PathBuf,
}

impl LogConfig {
    pub fn new(level: Level, pipe: impl Into<PathBuf>) -> Self {
        Self {
            level,
            pipe: pipe.into(),
        }
    }

    /// Reads `EASY_QUEUE_LOG_LEVEL` and `EASY_QUEUE_LOG_PIPE`, keeping the
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let level = match env::var(ENV_LEVEL_NAME) {
            Ok(s) => s.parse().unwrap_or(DEFAULT_LEVEL),
            Err(_) => DEFAULT_LEVEL,
        };

        let pipe = match env::var_os(ENV_PIPE_NAME) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => PathBuf::from(DEFAULT_PIPE),
        };

        Self { level, pipe }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL, DEFAULT_PIPE)
    }
}

/// State shared between a [`LogContext`] and its pipe reader.
pub(crate) struct Inner {
    level: AtomicU8,
    write_lock: SpinLock,
}

impl Inner {
    fn new(level: Level) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
            write_lock: SpinLock::new(),
        }
    }

    pub(crate) fn level(&self) -> Level {
        Level::try_from(self.level.load(Acquire)).unwrap_or(Level::Off)
    }

    pub(crate) fn set_level(&self, level: Level) {
        self.level.store(level as u8, Release);
    }

    pub(crate) fn print(
        &self,
        level: Level,
        module: &str,
        file: &str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> usize {
        if level == Level::Off || self.level() < level {
            return 0;
        }

        let (hour, min, sec) = clock::wall_clock();
        let buf = format!(
            "{}[{:02}:{:02}:{:02} {} {} {} {} ({})] {}{}\n",
            level.color(),
            hour,
            min,
            sec,
            level.tag(),
            module,
            clock::thread_id(),
            file,
            line,
            args,
            COLOR_NONE,
        );

        let _guard = self.write_lock.lock();
        let written = if level.to_stderr() {
            io::stderr().lock().write_all(buf.as_bytes())
        } else {
            io::stdout().lock().write_all(buf.as_bytes())
        };

        match written {
            Ok(()) => buf.len(),
            Err(_) => 0,
        }
    }
}

/// A running log facility.
///
/// Owns the control pipe and its reader thread; both are torn down by
/// [`deinit`](LogContext::deinit) or on drop. Pass the context (or an `Arc`
/// of it) to whatever needs to log.
pub struct LogContext {
    inner: Arc<Inner>,
    reader: Option<Reader>,
    pipe: PathBuf,
}

impl LogContext {
    /// Creates the control pipe and starts listening on it.
    ///
    /// # Errors
    ///
    /// [`Error::NullPointer`] for an empty pipe path,
    /// [`Error::InvalidParameter`] for an overlong one and [`Error::Io`]
    /// when the pipe or the reader thread cannot be created.
    pub fn init(config: LogConfig) -> Result<Self, Error> {
        if config.pipe.as_os_str().is_empty() {
            return Err(Error::NullPointer);
        }
        if config.pipe.as_os_str().len() >= MAX_PIPE_PATH {
            return Err(Error::InvalidParameter("pipe path too long"));
        }

        let inner = Arc::new(Inner::new(config.level));
        let reader = Reader::spawn(config.pipe.clone(), inner.clone())?;

        let ctx = Self {
            inner,
            reader: Some(reader),
            pipe: config.pipe,
        };
        ctx.print(
            Level::Info,
            module_path!(),
            file!(),
            line!(),
            format_args!("initialization, level {}", config.level),
        );
        Ok(ctx)
    }

    /// Stops the reader thread and removes the control pipe.
    pub fn deinit(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(reader) = self.reader.take() {
            self.print(
                Level::Info,
                module_path!(),
                file!(),
                line!(),
                format_args!("deinitialization"),
            );
            reader.stop(&self.inner);
        }
    }

    pub fn level(&self) -> Level {
        self.inner.level()
    }

    pub fn set_level(&self, level: Level) {
        self.inner.set_level(level);
    }

    /// Whether a line at `level` would be printed.
    pub fn enabled(&self, level: Level) -> bool {
        level != Level::Off && level <= self.level()
    }

    pub fn pipe_path(&self) -> &Path {
        &self.pipe
    }

    /// Prints one line if `level` is enabled, returning the number of bytes
    /// written.
    ///
    /// Lines go to stderr for [`Level::Error`] and [`Level::Warn`], to stdout
    /// otherwise. Prefer the [`log_info!`](crate::log_info) family of macros,
    /// which fill in the location.
    pub fn print(
        &self,
        level: Level,
        module: &str,
        file: &str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> usize {
        self.inner.print(level, module, file, line, args)
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("level", &self.level())
            .field("pipe", &self.pipe)
            .finish()
    }
}

/// Prints through a [`LogContext`] at the given [`Level`].
#[macro_export]
macro_rules! log_write {
    ($ctx:expr, $lv:expr, $($arg:tt)+) => {
        $ctx.print($lv, module_path!(), file!(), line!(), format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_print {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_write!($ctx, $crate::log::Level::Default, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_write!($ctx, $crate::log::Level::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_write!($ctx, $crate::log::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_write!($ctx, $crate::log::Level::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_debug1 {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_write!($ctx, $crate::log::Level::Debug1, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_debug2 {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_write!($ctx, $crate::log::Level::Debug2, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_debug3 {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_write!($ctx, $crate::log::Level::Debug3, $($arg)+)
    };
}
