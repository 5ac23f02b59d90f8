//! 日志输出
//!
//! A [`log::Log`] backend writing `[LEVEL] target: message` lines to whatever
//! [`fmt::Write`] sink was installed. On x86_64 that is normally COM1.

use alloc::boxed::Box;
use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

use crate::interrupts::without_interrupts;

type Sink = Box<dyn Write + Send>;

struct Logger {
    sink: Mutex<Option<Sink>>,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // 防止死锁
        without_interrupts(|| {
            if let Some(sink) = self.sink.lock().as_mut() {
                let _ = writeln!(sink, "[{:<5}] {}: {}", record.level(), record.target(), record.args());
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger {
    sink: Mutex::new(None),
};

/// Install `sink` and register the logger.
///
/// The sink is replaced even if a logger was already registered, so a later
/// call can move output to another device.
pub fn init(sink: Sink, level: LevelFilter) -> Result<(), SetLoggerError> {
    without_interrupts(|| *LOGGER.sink.lock() = Some(sink));
    log::set_max_level(level);
    log::set_logger(&LOGGER)
}

/// Log to COM1.
#[cfg(target_arch = "x86_64")]
pub fn init_serial(level: LevelFilter) -> Result<(), SetLoggerError> {
    init(Box::new(crate::io::serial::Com1Writer), level)
}

/// Adapter for sinks that are only reachable through a function.
pub struct FnSink<F>(pub F);

impl<F: FnMut(&str) + Send> Write for FnSink<F> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        (self.0)(s);
        Ok(())
    }
}
