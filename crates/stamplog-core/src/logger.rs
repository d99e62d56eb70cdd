//! The logger
//!
//! Each call runs the same pipeline:
//! 1. drop the call if its level is below the configured minimum
//! 2. clean stack traces found anywhere in the values
//! 3. build the prefix, moving leading newlines in front of it
//! 4. show the values on the console (if enabled)
//! 5. append `<prefix> <tag>: <serialized values>` to the file (if configured)

use std::path::Path;
use std::sync::Arc;

use crate::config::{InstanceId, LoggerConfig};
use crate::error::{LoggerError, LoggerResult};
use crate::format::{
    generate_instance_id, DateInput, DisplayZone, PrefixBuilder, TimestampFormat, ValueSerializer,
};
use crate::sink::{report, ConsoleWriter, FileSink, SharedConsole, StdConsole};
use crate::stack::{CleanError, DefaultStackCleaner, Sanitizer, SharedStackCleaner};
use crate::types::{LogLevel, LogValue};

/// Timestamped logger writing to the console and optionally to a file
///
/// Leveled methods return `Ok(true)` when it is fine to keep writing and
/// `Ok(false)` when the file sink is backed up and the caller may want to
/// `drain().await`.
///
/// Dropping the logger ends the file stream without waiting for it; await
/// `close()` to make sure every line reached the disk.
///
/// # Example
///
/// ```no_run
/// use stamplog_core::{log_info, Logger, LoggerConfig};
///
/// # async fn run() -> Result<(), stamplog_core::LoggerError> {
/// let logger = Logger::new(LoggerConfig::new().with_filename("app.log"))?;
/// log_info!(logger, "\nStarting", 42, true)?;
/// logger.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Logger {
    config: LoggerConfig,
    format: TimestampFormat,
    prefix: PrefixBuilder,
    serializer: ValueSerializer,
    cleaner: Option<SharedStackCleaner>,
    console: SharedConsole,
    file: Option<FileSink>,
}

impl Logger {
    /// Create a logger writing to the process console
    pub fn new(config: LoggerConfig) -> LoggerResult<Self> {
        Self::with_console(config, Arc::new(StdConsole::new()))
    }

    /// Create a logger with a custom console writer
    pub fn with_console(config: LoggerConfig, console: SharedConsole) -> LoggerResult<Self> {
        config.validate()?;

        let format = config.timestamp_format();
        let instance_id = match &config.id {
            InstanceId::Disabled => None,
            InstanceId::Literal(id) => Some(id.clone()),
            InstanceId::Auto => Some(generate_instance_id()),
        };
        let cleaner = config
            .clean_stack
            .options()
            .map(|options| Arc::new(DefaultStackCleaner::new(options)) as SharedStackCleaner);

        let file = match &config.filename {
            Some(path) => Some(
                FileSink::open(path, console.clone(), format)
                    .map_err(|e| LoggerError::io(path.display().to_string(), e))?,
            ),
            None => None,
        };

        Ok(Self {
            prefix: PrefixBuilder::new(format, instance_id),
            serializer: ValueSerializer::new(format),
            format,
            cleaner,
            console,
            file,
            config,
        })
    }

    /// Replace the stack cleaner built from the configuration
    pub fn with_stack_cleaner(mut self, cleaner: SharedStackCleaner) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Render timestamps and dates in `zone` instead of the configured one
    pub fn with_display_zone(mut self, zone: DisplayZone) -> Self {
        self.format.zone = zone;
        let instance_id = self.prefix.instance_id().map(str::to_string);
        self.prefix = PrefixBuilder::new(self.format, instance_id);
        self.serializer = ValueSerializer::new(self.format);
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// The id shown after the timestamp, if any
    pub fn instance_id(&self) -> Option<&str> {
        self.prefix.instance_id()
    }

    /// Path of the file sink, if any
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|file| file.path())
    }

    pub fn debug(&self, values: Vec<LogValue>) -> LoggerResult<bool> {
        self.log(LogLevel::Debug, values)
    }

    pub fn info(&self, values: Vec<LogValue>) -> LoggerResult<bool> {
        self.log(LogLevel::Info, values)
    }

    pub fn warn(&self, values: Vec<LogValue>) -> LoggerResult<bool> {
        self.log(LogLevel::Warn, values)
    }

    pub fn error(&self, values: Vec<LogValue>) -> LoggerResult<bool> {
        self.log(LogLevel::Error, values)
    }

    /// Log a single message at debug level
    pub fn write(&self, message: impl Into<LogValue>) -> LoggerResult<bool> {
        self.debug(vec![message.into()])
    }

    /// Log `values` at `level`
    pub fn log(&self, level: LogLevel, values: Vec<LogValue>) -> LoggerResult<bool> {
        if !level.passes(self.config.level) {
            return Ok(true);
        }

        let mut values = self.sanitize(values)?;
        let prefix = self.prefix.build(&mut values);

        if self.config.console {
            self.console.write(level, &prefix, &values);
        }

        let Some(file) = &self.file else {
            return Ok(true);
        };
        let line = format!(
            "{} {}: {}\n",
            prefix,
            level.file_tag(),
            self.serializer.serialize_values(&values)
        );
        Ok(file.write(line))
    }

    /// The bracketed current time, e.g. `[2024-01-31 12:00:00]`
    pub fn timestamp(&self) -> String {
        self.prefix.timestamp()
    }

    /// Normalize a date-like value with this logger's zone and precision
    pub fn format_date(&self, input: impl Into<DateInput>) -> LoggerResult<String> {
        Ok(self.format.normalize(input)?)
    }

    /// Wait until the file sink can take more lines without backing up
    pub async fn drain(&self) {
        if let Some(file) = &self.file {
            file.drain().await;
        }
    }

    /// End the file stream without waiting for pending lines
    pub fn end(&self) {
        if let Some(file) = &self.file {
            file.end();
        }
    }

    /// Flush and release the file sink. A no-op without one.
    pub async fn close(&self) {
        if let Some(file) = &self.file {
            file.close().await;
        }
    }

    fn sanitize(&self, values: Vec<LogValue>) -> LoggerResult<Vec<LogValue>> {
        let Some(cleaner) = &self.cleaner else {
            return Ok(values);
        };

        let console: &dyn ConsoleWriter = self.console.as_ref();
        let format = &self.format;
        let mut sanitizer = Sanitizer::new(cleaner.as_ref(), |err: CleanError| {
            report(
                console,
                format,
                LogLevel::Warn,
                format!("Could not clean stack trace, logging it unchanged: {}", err),
            );
        });

        sanitizer
            .sanitize_all(values)
            .map_err(LoggerError::StackCleaningUnavailable)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.end();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .field("instance_id", &self.instance_id())
            .field("file", &self.file)
            .finish()
    }
}

/// Log at debug level: `log_debug!(logger, "value", 1, true)`
#[macro_export]
macro_rules! log_debug {
    ($logger:expr $(, $value:expr)* $(,)?) => {
        $logger.debug(vec![$($crate::LogValue::from($value)),*])
    };
}

/// Log at info level: `log_info!(logger, "value", 1, true)`
#[macro_export]
macro_rules! log_info {
    ($logger:expr $(, $value:expr)* $(,)?) => {
        $logger.info(vec![$($crate::LogValue::from($value)),*])
    };
}

/// Log at warn level: `log_warn!(logger, "value", 1, true)`
#[macro_export]
macro_rules! log_warn {
    ($logger:expr $(, $value:expr)* $(,)?) => {
        $logger.warn(vec![$($crate::LogValue::from($value)),*])
    };
}

/// Log at error level: `log_error!(logger, "value", 1, true)`
#[macro_export]
macro_rules! log_error {
    ($logger:expr $(, $value:expr)* $(,)?) => {
        $logger.error(vec![$($crate::LogValue::from($value)),*])
    };
}
