//! Console logger backend for the `log` facade.

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::Once;

use crate::drivers::console::Console;

struct ConsoleLogger {
    console: Once<&'static dyn Console>,
}

static LOGGER: ConsoleLogger = ConsoleLogger {
    console: Once::new(),
};

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(console) = self.console.get() {
            crate::cprintln!(
                *console,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

/// Route `log` records to `console`.
///
/// Can only succeed once; later calls report the logger already installed.
pub fn init(console: &'static dyn Console, level: LevelFilter) -> Result<(), SetLoggerError> {
    LOGGER.console.call_once(|| console);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
