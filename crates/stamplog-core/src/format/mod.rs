//! Line formatting
//!
//! - `timestamp`: date normalization and the bracketed time prefix
//! - `prefix`: per-call prefix with leading newlines and instance id
//! - `serialize`: file rendering of log values
//! - `ansi`: terminal escape codes

pub mod ansi;
pub mod prefix;
pub mod serialize;
pub mod timestamp;

pub use prefix::{generate_instance_id, PrefixBuilder};
pub use serialize::ValueSerializer;
pub use timestamp::{DateInput, DisplayZone, TimestampError, TimestampFormat, TimestampResult};
