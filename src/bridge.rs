use crate::normalize::{PlainRecord, SinkRecord};
use crate::sink::SinkHandle;

/// Bridge that forwards `log` facade records into the pipeline as plain
/// records.
///
/// Useful when parts of the dependency tree still log through the `log`
/// macros rather than `tracing`. Bridged records carry only the plain
/// shape: level name, message and best-effort source location.
pub struct StdLogBridge {
    handle: SinkHandle,
    max_level: log::LevelFilter,
}

impl StdLogBridge {
    pub fn new(handle: SinkHandle, max_level: log::LevelFilter) -> Self {
        Self { handle, max_level }
    }

    /// Register this bridge as the global `log` logger.
    ///
    /// Returns the underlying error if a global logger is already
    /// installed; the caller decides whether that is fatal.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self)).map(|()| log::set_max_level(max_level))
    }
}

impl log::Log for StdLogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.handle.submit(SinkRecord::Plain(PlainRecord {
            level_name: Some(record.level().to_string()),
            message: record.args().to_string(),
            logger: Some(record.target().to_string()),
            function: record.module_path().map(|s| s.to_string()),
            line: record.line(),
        }));
    }

    fn flush(&self) {}
}
