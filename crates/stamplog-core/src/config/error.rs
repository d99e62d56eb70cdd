//! Configuration errors

use crate::types::ParseLevelError;

/// Errors that can occur while building or loading a `LoggerConfig`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Either console output or a log filename is required")]
    NoOutput,

    #[error("{0}")]
    InvalidLevel(#[from] ParseLevelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
