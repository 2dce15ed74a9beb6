mod error;
mod timeout;
mod trace;

pub mod log;
pub mod queue;

pub use error::{Error, PutError};
pub use log::{Level, LogConfig, LogContext};
pub use queue::{Local, Mode, Queue, Shared};
pub use timeout::{Timeout, INFINITE_MS};
pub use trace::init_tracing;
