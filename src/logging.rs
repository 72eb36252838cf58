//! Logging setup.
//!
//! Everything in the crate logs through the `log` facade. This module keeps
//! the DxLib-style numeric log levels (as accepted by
//! `SetOutApplicationLogValidFlag`-like switches) and installs a small stderr
//! sink for hosts that do not bring their own logger.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

/// Log levels matching the numeric levels exposed to callers.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    #[default]
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    /// Get the integer representation
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Level filter for the `log` facade.
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::User | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }
}

/// Writes records to stderr as `[LEVEL target] message`.
pub struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{} {}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the stderr logger and set the maximum level.
///
/// Fails if another logger was already installed; the level is applied either way.
pub fn init_logging(level: LogLevel) -> Result<(), log::SetLoggerError> {
    log::set_max_level(level.level_filter());
    log::set_logger(&LOGGER)
}

/// Convenience macro for errors
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        ::log::error!($($arg)*)
    };
}

/// Convenience macro for warnings
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        ::log::warn!($($arg)*)
    };
}

/// Convenience macro for info messages
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ::log::info!($($arg)*)
    };
}

/// Convenience macro for debug messages
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        ::log::debug!($($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_i32() {
        assert_eq!(LogLevel::from_i32(0), LogLevel::Nothing);
        assert_eq!(LogLevel::from_i32(1), LogLevel::User);
        assert_eq!(LogLevel::from_i32(2), LogLevel::Error);
        assert_eq!(LogLevel::from_i32(3), LogLevel::Warning);
        assert_eq!(LogLevel::from_i32(4), LogLevel::Info);
        assert_eq!(LogLevel::from_i32(5), LogLevel::Debug);
        assert_eq!(LogLevel::from_i32(6), LogLevel::All);
    }

    #[test]
    fn test_log_level_invalid() {
        assert_eq!(LogLevel::from_i32(100), LogLevel::Info);
        assert_eq!(LogLevel::from_i32(-1), LogLevel::Info);
    }

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(LogLevel::Nothing.level_filter(), LevelFilter::Off);
        assert_eq!(LogLevel::User.level_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::Warning.level_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::All.level_filter(), LevelFilter::Trace);
        assert_eq!(LogLevel::Debug.as_i32(), 5);
    }

    #[test]
    fn test_init_twice_is_not_fatal() {
        let _ = init_logging(LogLevel::Debug);
        assert!(init_logging(LogLevel::Debug).is_err());
        log_info!("Info message: {}", 42);
        log_error!("Error code: {}", -1);
        log_warning!("Warning!");
        log_debug!("Debug info");
    }
}
