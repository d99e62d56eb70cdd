//! In-memory console writer

use parking_lot::Mutex;

use super::traits::ConsoleWriter;
use crate::types::{LogLevel, LogValue};

/// One recorded console call
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleLine {
    pub level: LogLevel,
    pub prefix: String,
    pub values: Vec<LogValue>,
}

impl ConsoleLine {
    /// The values rendered the way `StdConsole` shows them
    pub fn message(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Console writer that records every call
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use stamplog_core::sink::{ConsoleWriter, MemoryConsole};
/// use stamplog_core::{LogLevel, LogValue};
///
/// let console = Arc::new(MemoryConsole::new());
/// console.write(LogLevel::Info, "[t]", &[LogValue::from("hello")]);
/// assert_eq!(console.lines()[0].message(), "hello");
/// ```
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Mutex<Vec<ConsoleLine>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.lines.lock().clone()
    }

    /// Lines recorded at `level`
    pub fn lines_at(&self, level: LogLevel) -> Vec<ConsoleLine> {
        self.lines
            .lock()
            .iter()
            .filter(|line| line.level == level)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl ConsoleWriter for MemoryConsole {
    fn write(&self, level: LogLevel, prefix: &str, values: &[LogValue]) {
        self.lines.lock().push(ConsoleLine {
            level,
            prefix: prefix.to_string(),
            values: values.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_console_records() {
        let console = MemoryConsole::new();
        assert!(console.is_empty());

        console.write(LogLevel::Info, "[a]", &[LogValue::from("one"), LogValue::Integer(2)]);
        console.write(LogLevel::Warn, "[b]", &[LogValue::from("three")]);

        assert_eq!(console.len(), 2);
        assert_eq!(console.lines()[0].message(), "one 2");
        assert_eq!(console.lines_at(LogLevel::Warn)[0].prefix, "[b]");

        console.clear();
        assert!(console.is_empty());
    }
}
