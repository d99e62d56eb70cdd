//! Stamplog Core
//!
//! Timestamped logging to the console and an append-mode file.
//! Every line carries a `[YYYY-MM-DD HH:MM:SS]` prefix (optionally with
//! milliseconds and an instance id), stack traces are cleaned before they
//! are written, and file output renders structured values as pretty JSON.
//!
//! ```rust,no_run
//! use stamplog_core::{log_error, log_info, ErrorValue, InstanceId, Logger, LoggerConfig};
//!
//! # async fn run() -> Result<(), stamplog_core::LoggerError> {
//! let config = LoggerConfig::new()
//!     .with_filename("service.log")
//!     .with_id(InstanceId::Auto)
//!     .with_env_overrides()?;
//! let logger = Logger::new(config)?;
//!
//! log_info!(logger, "\nListening on", 8080)?;
//! let timeout = ErrorValue::new("TimeoutError", "upstream took too long");
//! log_error!(logger, "request failed", timeout)?;
//!
//! logger.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod logger;
pub mod sink;
pub mod stack;
pub mod types;

pub use config::{CleanStackSetting, ConfigError, ConfigResult, InstanceId, LoggerConfig};
pub use error::{LoggerError, LoggerResult};
pub use format::{DateInput, DisplayZone, TimestampError, TimestampFormat};
pub use logger::Logger;
pub use sink::{ConsoleWriter, MemoryConsole, NoOpConsole, SharedConsole, StdConsole};
pub use stack::{
    CleanError, CleanStackOptions, DefaultStackCleaner, SharedStackCleaner, StackCleaner,
};
pub use types::{ErrorValue, LogLevel, LogValue, ParseLevelError};
