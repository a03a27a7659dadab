//! TEAM_221: Host logger.
//!
//! Routes `log` records to stderr when the crate runs on a host (tests,
//! tools). The kernel installs its own logger.

use log::{Level, LevelFilter, Metadata, Record};

static LOGGER: HostLogger = HostLogger;

struct HostLogger;

impl log::Log for HostLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Trace
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            std::eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the logger. Fails if another logger is already set.
pub fn init(max_level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(max_level);
    Ok(())
}
