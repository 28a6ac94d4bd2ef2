//! Console logger for the `log` facade.
//!
//! Lines are written to stderr as `[HH:MM:SS.mmm] [LEVEL] [target] message`.
//! Stdout is left to the `## ...` protocol lines read by the CI log parser.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::Write;

/// Target used by [`log_parsed!`] for high-level run events.
pub const PARSED_TARGET: &str = "parsed";

/// Info-level record under the calling module's target.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::log::info!("{}", msg);
    }}
}

/// Info-level record under the `parsed` target, for milestones a reader of
/// the CI log scans for.
#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        $crate::log::info!(target: $crate::logging::PARSED_TARGET, "{}", msg);
    }}
}

/// Logger that writes every enabled record to stderr.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub const fn new(level: LevelFilter) -> Self {
        ConsoleLogger { level }
    }

    /// Render one record; kept separate from `log` so it can be tested.
    pub fn format_line(level: Level, target: &str, message: &str) -> String {
        format!(
            "[{}] [{}] [{}] {}",
            Local::now().format("%H:%M:%S%.3f"),
            level,
            target,
            message
        )
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format_line(record.level(), record.target(), &record.args().to_string());
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Map a `KDECI_LOG_LEVEL` value to a filter; `None` when unrecognised.
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Install the console logger as the global `log` backend.
///
/// Calling this more than once is harmless: the first logger stays installed.
pub fn initialize_logging(requested: Option<&str>) {
    let level = match requested {
        Some(value) => parse_level(value).unwrap_or_else(|| {
            eprintln!(
                "[Logging] WARNING: Unknown log level '{}', using 'info'",
                value
            );
            LevelFilter::Info
        }),
        None => LevelFilter::Info,
    };

    if log::set_boxed_logger(Box::new(ConsoleLogger::new(level))).is_ok() {
        log::set_max_level(level);
        log::debug!("[Logging] Console logger initialized at level {}", level);
    }
}
