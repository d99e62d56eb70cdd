//! Core types for log calls
//!
//! This module contains the value and level types shared by the formatter,
//! the stack sanitizer and the sinks.

mod level;
mod value;

pub use level::{LogLevel, ParseLevelError};
pub use value::{ErrorValue, LogValue};
