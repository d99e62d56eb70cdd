//! Output sinks
//!
//! - `ConsoleWriter`: console seam (`StdConsole`, `MemoryConsole`, `NoOpConsole`)
//! - `FileSink`: append-mode file written from a background thread

mod console;
mod file;
mod memory;
mod noop;
mod traits;

pub use console::StdConsole;
pub use file::{FileSink, HIGH_WATER_MARK};
pub use memory::{ConsoleLine, MemoryConsole};
pub use noop::NoOpConsole;
pub use traits::{BoxedConsole, ConsoleWriter, SharedConsole};

pub(crate) use traits::report;
