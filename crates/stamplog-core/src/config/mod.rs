//! Logger configuration
//!
//! `LoggerConfig` can be built in code, loaded from YAML or JSON, and
//! adjusted from `STAMPLOG_*` environment variables.

mod error;
mod options;

pub use error::{ConfigError, ConfigResult};
pub use options::{CleanStackSetting, InstanceId, LoggerConfig, ENV_FILE, ENV_LEVEL, ENV_UTC};
