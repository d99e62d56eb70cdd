//! Stack cleaner trait and errors

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while cleaning a stack trace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CleanError {
    /// Pretty paths need the home directory and it could not be resolved
    #[error(
        "cannot resolve the home directory needed to shorten stack trace paths; \
         set HOME (or grant the process access to it), pass an explicit `basePath`, \
         or disable `pretty` in the `cleanStack` options"
    )]
    HomeDirUnavailable,

    /// Any other cleaning failure. The stack is left as it was.
    #[error("Stack cleaning failed: {0}")]
    Other(String),
}

impl CleanError {
    /// Whether this error must abort the log call instead of being reported
    pub fn is_fatal(&self) -> bool {
        matches!(self, CleanError::HomeDirUnavailable)
    }
}

pub type CleanResult<T> = Result<T, CleanError>;

/// Trait for stack trace cleaners
///
/// Implementations:
/// - `DefaultStackCleaner`: drops runtime frames, shortens paths
/// - Any `Fn(&str) -> CleanResult<String>` closure
pub trait StackCleaner: Send + Sync {
    /// Human-readable name of this cleaner
    fn name(&self) -> &str {
        "custom"
    }

    /// Return the cleaned version of `stack`
    fn clean(&self, stack: &str) -> CleanResult<String>;
}

impl<F> StackCleaner for F
where
    F: Fn(&str) -> CleanResult<String> + Send + Sync,
{
    fn clean(&self, stack: &str) -> CleanResult<String> {
        self(stack)
    }
}

/// Type alias for an Arc-wrapped cleaner
pub type SharedStackCleaner = Arc<dyn StackCleaner>;
