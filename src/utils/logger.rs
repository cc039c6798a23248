/*
 * XIO Logger
 *
 * `log` backend that prints records to whichever device is bound as
 * stderr. Writes never block: when the transmit buffer is full the rest of
 * the record is dropped, so logging is safe from interrupt handlers.
 *
 * Records emitted before the descriptor table exists are discarded.
 */

use core::fmt::{self, Write};

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::io::try_table;

struct XioLogger;

impl log::Log for XioLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(table) = try_table() {
            let _ = write_record(&mut table.stderr(), record);
        }
    }

    fn flush(&self) {}
}

static LOGGER: XioLogger = XioLogger;

/// Format one record as `[LEVEL] message` followed by a newline.
pub fn write_record<W: Write>(out: &mut W, record: &Record) -> fmt::Result {
    writeln!(out, "[{}] {}", record.level(), record.args())
}

/// Install the logger and set the maximum level.
///
/// Fails if a logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
