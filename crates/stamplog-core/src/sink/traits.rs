//! Console writer trait definition

use std::sync::Arc;

use crate::format::TimestampFormat;
use crate::types::{LogLevel, LogValue};

/// Destination for console output
///
/// Implementations:
/// - `StdConsole`: stdout/stderr with a colored prefix
/// - `MemoryConsole`: records lines, for tests and embedding
/// - `NoOpConsole`: discards everything
pub trait ConsoleWriter: Send + Sync {
    /// Display one log call. `values` are shown with their native rendering.
    fn write(&self, level: LogLevel, prefix: &str, values: &[LogValue]);
}

/// Type alias for a boxed console writer
pub type BoxedConsole = Box<dyn ConsoleWriter>;

/// Type alias for an Arc-wrapped console writer
pub type SharedConsole = Arc<dyn ConsoleWriter>;

/// Report a problem of the logger itself on the console
pub(crate) fn report(
    console: &dyn ConsoleWriter,
    format: &TimestampFormat,
    level: LogLevel,
    message: String,
) {
    console.write(level, &format.bracketed_now(), &[LogValue::String(message)]);
}
