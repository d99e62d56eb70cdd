//! Standard console writer

use super::traits::ConsoleWriter;
use crate::format::ansi::{GREY, RED, RESET, YELLOW};
use crate::types::{LogLevel, LogValue};

/// Writes debug/info to stdout and warn/error to stderr, coloring the prefix
#[derive(Debug, Clone)]
pub struct StdConsole {
    colors: bool,
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl StdConsole {
    /// Create a console writer. Colors are on unless `NO_COLOR` is set.
    pub fn new() -> Self {
        Self {
            colors: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Create a console writer that never emits escape codes
    pub fn without_colors() -> Self {
        Self { colors: false }
    }

    fn paint(&self, level: LogLevel, prefix: &str) -> String {
        let color = match level {
            LogLevel::Debug => GREY,
            LogLevel::Info => "",
            LogLevel::Warn => YELLOW,
            LogLevel::Error => RED,
        };
        if !self.colors || color.is_empty() {
            return prefix.to_string();
        }

        // Leading newlines stay outside the colored span
        let body = prefix.trim_start_matches('\n');
        let newlines = &prefix[..prefix.len() - body.len()];
        format!("{}{}{}{}", newlines, color, body, RESET)
    }
}

impl ConsoleWriter for StdConsole {
    fn write(&self, level: LogLevel, prefix: &str, values: &[LogValue]) {
        let message = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        let prefix = self.paint(level, prefix);

        match level {
            LogLevel::Debug | LogLevel::Info => println!("{} {}", prefix, message),
            LogLevel::Warn | LogLevel::Error => eprintln!("{} {}", prefix, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_levels() {
        let console = StdConsole { colors: true };
        assert_eq!(console.paint(LogLevel::Info, "[t]"), "[t]");
        assert_eq!(console.paint(LogLevel::Debug, "[t]"), format!("{}[t]{}", GREY, RESET));
        assert_eq!(console.paint(LogLevel::Warn, "\n\n[t]"), format!("\n\n{}[t]{}", YELLOW, RESET));
        assert_eq!(console.paint(LogLevel::Error, "[t]"), format!("{}[t]{}", RED, RESET));
    }

    #[test]
    fn test_without_colors() {
        let console = StdConsole::without_colors();
        assert_eq!(console.paint(LogLevel::Error, "[t]"), "[t]");
    }

    #[test]
    fn test_console_writes() {
        // This test just verifies the writer doesn't panic
        let console = StdConsole::new();
        let values = [LogValue::from("message"), LogValue::Integer(1)];
        for level in LogLevel::ALL {
            console.write(level, "[2024-01-01 00:00:00]", &values);
        }
    }
}
