//! Moves numbers through a synchronized queue while logging through a
//! pipe-controlled context.
//!
//! ```text
//! EASY_QUEUE_LOG_PIPE=/tmp/q cargo run --bin pipeline &
//! echo loglevel 5 > /tmp/q
//! ```

use std::env;
use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use easy_queue::{log_debug1, log_info, log_warn};
use easy_queue::{init_tracing, LogConfig, LogContext, Queue, Shared, Timeout};

const CAPACITY: u16 = 16;

const DEFAULT_COUNT: u64 = 100;

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let count = match env::args().nth(1) {
        Some(s) => s.parse()?,
        None => DEFAULT_COUNT,
    };

    let log = Arc::new(LogContext::init(LogConfig::from_env())?);
    log_info!(log, "control pipe at {}", log.pipe_path().display());

    let queue = Arc::new(Shared::create(CAPACITY)?);

    let producer = {
        let queue = queue.clone();
        let log = log.clone();
        thread::spawn(move || {
            for i in 0..count {
                if let Err(e) = queue.put(i, Timeout::Infinite) {
                    log_warn!(log, "put {}: {}", i, e);
                    return;
                }
                log_debug1!(log, "put {}", i);
                thread::sleep(Duration::from_millis(20));
            }
        })
    };

    let mut sum = 0;
    for _ in 0..count {
        match queue.get(Timeout::from_millis(1000)) {
            Ok(v) => sum += v,
            Err(e) => {
                log_warn!(log, "get: {}", e);
                break;
            }
        }
    }

    producer.join().map_err(|_| "producer panicked")?;
    log_info!(log, "received {} values, sum {}", count, sum);

    queue.destroy()?;
    if let Ok(log) = Arc::try_unwrap(log) {
        log.deinit();
    }
    Ok(())
}
