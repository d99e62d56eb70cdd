//! No-op console writer

use super::traits::ConsoleWriter;
use crate::types::{LogLevel, LogValue};

/// A console writer that does nothing
///
/// Useful for silencing diagnostics in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpConsole;

impl NoOpConsole {
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleWriter for NoOpConsole {
    fn write(&self, _level: LogLevel, _prefix: &str, _values: &[LogValue]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_console() {
        let console = NoOpConsole::new();
        for level in LogLevel::ALL {
            console.write(level, "[t]", &[LogValue::from("ignored")]);
        }
    }
}
