//! Diagnostic reporting.
//!
//! Components never log through a global; they take a `&dyn Reporter`.
//! [`LogReporter`] forwards to the [`log`] facade and [`MemoryReporter`]
//! keeps messages in memory so tests can assert on them.

use log::Level;
use std::cell::RefCell;

/// Sink for diagnostic messages at debug, info and error levels.
pub trait Reporter {
    fn report(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.report(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }
}

/// Forwards every message to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, level: Level, message: &str) {
        log::log!(level, "{message}");
    }
}

/// Captures messages in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured messages, oldest first.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    /// Captured messages at exactly `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.borrow().iter().any(|(l, _)| *l == Level::Error)
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_captures_levels() {
        let reporter = MemoryReporter::new();
        reporter.debug("one");
        reporter.info("two");
        reporter.error("three");

        assert_eq!(reporter.entries().len(), 3);
        assert_eq!(reporter.messages(Level::Info), vec!["two".to_string()]);
        assert!(reporter.has_errors());
    }

    #[test]
    fn test_memory_reporter_starts_empty() {
        let reporter = MemoryReporter::new();
        assert!(reporter.entries().is_empty());
        assert!(!reporter.has_errors());
    }
}
