//! Leveled line logger consumed by the pipeline stages.

use std::fmt;

/// `tracing` target used by [`TracingLogger`]
pub const LOG_TARGET: &str = "modkit_http_log";

/// Severity of a log line, ordered by verbosity: `Error < Warning < Info < Debug`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for the text lines produced by the stages.
///
/// `level` must be cheap: stages consult it before doing any debug-only work
/// (header redaction, body reads, curl formatting).
pub trait PolicyLogger: Send + Sync {
    /// Most verbose level currently written
    fn level(&self) -> LogLevel;

    /// Write one line
    fn log(&self, level: LogLevel, message: &str);

    fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level()
    }

    fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

/// [`PolicyLogger`] that forwards every line to `tracing` under [`LOG_TARGET`].
///
/// The active level is whatever the installed subscriber enables for that
/// target, so `RUST_LOG=modkit_http_log=debug` turns on header and body dumps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PolicyLogger for TracingLogger {
    fn level(&self) -> LogLevel {
        if tracing::enabled!(target: LOG_TARGET, tracing::Level::DEBUG) {
            LogLevel::Debug
        } else if tracing::enabled!(target: LOG_TARGET, tracing::Level::INFO) {
            LogLevel::Info
        } else if tracing::enabled!(target: LOG_TARGET, tracing::Level::WARN) {
            LogLevel::Warning
        } else {
            LogLevel::Error
        }
    }

    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: LOG_TARGET, "{message}"),
            LogLevel::Warning => tracing::warn!(target: LOG_TARGET, "{message}"),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, "{message}"),
            LogLevel::Debug => tracing::debug!(target: LOG_TARGET, "{message}"),
        }
    }
}
