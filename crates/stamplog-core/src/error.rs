//! Logger error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::format::TimestampError;
use crate::stack::CleanError;

/// Errors surfaced by `Logger`
#[derive(Error, Debug)]
pub enum LoggerError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The log file could not be opened
    #[error("Cannot open log file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stack cleaning needs a capability the process does not have
    #[error("Stack cleaning is unavailable: {0}")]
    StackCleaningUnavailable(CleanError),

    /// A date could not be normalized
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
}

impl LoggerError {
    /// Create a file open error
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the "no console and no file" configuration error
    pub fn is_no_output(&self) -> bool {
        matches!(self, LoggerError::Config(ConfigError::NoOutput))
    }
}

pub type LoggerResult<T> = Result<T, LoggerError>;
