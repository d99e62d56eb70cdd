//! Stack trace cleaning
//!
//! - `StackCleaner`: cleaning seam, implemented by `DefaultStackCleaner` and closures
//! - `Sanitizer`: finds error-like values in nested structures and cleans them

mod clean;
mod sanitize;
mod traits;

pub use clean::{CleanStackOptions, DefaultStackCleaner, PathFilter};
pub use sanitize::Sanitizer;
pub use traits::{CleanError, CleanResult, SharedStackCleaner, StackCleaner};
