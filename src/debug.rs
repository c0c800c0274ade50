//! Log output over the USB serial/JTAG console.
//!
//! A `log::Log` backend for the firmware. Every record is printed through
//! `esp-println`, prefixed with the level and milliseconds since boot.

use embassy_time::Instant;
use log::{LevelFilter, Log, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            esp_println::println!(
                "[{:>8}ms {:<5}] {}",
                Instant::now().as_millis(),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Install the logger.
///
/// Must be called once during startup, before any task logs. Later calls
/// are ignored.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
