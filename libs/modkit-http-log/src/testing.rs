//! In-memory logger for stage tests.

use crate::logger::{LogLevel, PolicyLogger};
use std::sync::Mutex;

/// Records every line at or below its configured level
pub(crate) struct RecordingLogger {
    level: LogLevel,
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    pub(crate) fn new(level: LogLevel) -> Self {
        Self {
            level,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, line)| line).collect()
    }

    pub(crate) fn at(&self, level: LogLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line)
            .collect()
    }
}

impl PolicyLogger for RecordingLogger {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn log(&self, level: LogLevel, message: &str) {
        if self.enabled(level) {
            self.lines.lock().unwrap().push((level, message.to_owned()));
        }
    }
}
