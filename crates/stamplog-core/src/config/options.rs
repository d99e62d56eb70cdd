//! Logger options

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::format::{DisplayZone, TimestampFormat};
use crate::stack::CleanStackOptions;
use crate::types::LogLevel;

/// Overrides the minimum level
pub const ENV_LEVEL: &str = "STAMPLOG_LEVEL";
/// `1`/`true` switches timestamps to UTC
pub const ENV_UTC: &str = "STAMPLOG_UTC";
/// Overrides the log file path
pub const ENV_FILE: &str = "STAMPLOG_FILE";

/// Whether and how stack traces are cleaned
///
/// In configuration files this is either a bool or an options object:
///
/// ```yaml
/// cleanStack: false
/// # or
/// cleanStack:
///   pretty: true
///   basePath: /srv/app
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawCleanStack", into = "RawCleanStack")]
pub enum CleanStackSetting {
    Off,
    /// Clean with pretty (home-relative) paths
    #[default]
    Default,
    Custom(CleanStackOptions),
}

impl CleanStackSetting {
    /// The options to clean with, or `None` when cleaning is off
    pub fn options(&self) -> Option<CleanStackOptions> {
        match self {
            CleanStackSetting::Off => None,
            CleanStackSetting::Default => Some(CleanStackOptions::pretty()),
            CleanStackSetting::Custom(options) => Some(options.clone()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawCleanStack {
    Flag(bool),
    Options(CleanStackOptions),
}

impl From<RawCleanStack> for CleanStackSetting {
    fn from(raw: RawCleanStack) -> Self {
        match raw {
            RawCleanStack::Flag(true) => CleanStackSetting::Default,
            RawCleanStack::Flag(false) => CleanStackSetting::Off,
            RawCleanStack::Options(options) => CleanStackSetting::Custom(options),
        }
    }
}

impl From<CleanStackSetting> for RawCleanStack {
    fn from(setting: CleanStackSetting) -> Self {
        match setting {
            CleanStackSetting::Off => RawCleanStack::Flag(false),
            CleanStackSetting::Default => RawCleanStack::Flag(true),
            CleanStackSetting::Custom(options) => RawCleanStack::Options(options),
        }
    }
}

/// Instance id shown after the timestamp
///
/// Configured as a string (used as-is) or `true` (a random 4-character id
/// generated once per logger).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawInstanceId", into = "RawInstanceId")]
pub enum InstanceId {
    #[default]
    Disabled,
    Literal(String),
    Auto,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawInstanceId {
    Flag(bool),
    Literal(String),
}

impl From<RawInstanceId> for InstanceId {
    fn from(raw: RawInstanceId) -> Self {
        match raw {
            RawInstanceId::Flag(true) => InstanceId::Auto,
            RawInstanceId::Flag(false) => InstanceId::Disabled,
            RawInstanceId::Literal(id) => InstanceId::Literal(id),
        }
    }
}

impl From<InstanceId> for RawInstanceId {
    fn from(id: InstanceId) -> Self {
        match id {
            InstanceId::Disabled => RawInstanceId::Flag(false),
            InstanceId::Auto => RawInstanceId::Flag(true),
            InstanceId::Literal(id) => RawInstanceId::Literal(id),
        }
    }
}

/// Logger configuration
///
/// Every field has a default, so a config file only lists what it changes.
///
/// # Example
///
/// ```
/// use stamplog_core::{LoggerConfig, LogLevel};
///
/// let yaml = "filename: app.log\nlevel: warn\nid: worker-1\n";
/// let config = LoggerConfig::from_yaml_str(yaml).unwrap();
/// assert_eq!(config.level, LogLevel::Warn);
/// assert!(config.console);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    /// Mirror lines to the console
    pub console: bool,

    /// Append lines to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,

    /// Add `.mmm` milliseconds to timestamps
    pub show_millis: bool,

    pub clean_stack: CleanStackSetting,

    pub id: InstanceId,

    /// Render timestamps in UTC instead of local time
    pub utc_time: bool,

    /// Minimum level that produces output
    pub level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            filename: None,
            show_millis: false,
            clean_stack: CleanStackSetting::Default,
            id: InstanceId::Disabled,
            utc_time: false,
            level: LogLevel::Debug,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_show_millis(mut self, show_millis: bool) -> Self {
        self.show_millis = show_millis;
        self
    }

    pub fn with_clean_stack(mut self, clean_stack: CleanStackSetting) -> Self {
        self.clean_stack = clean_stack;
        self
    }

    pub fn with_id(mut self, id: InstanceId) -> Self {
        self.id = id;
        self
    }

    pub fn with_utc_time(mut self, utc_time: bool) -> Self {
        self.utc_time = utc_time;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Check that at least one output is enabled
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.console && self.filename.is_none() {
            return Err(ConfigError::NoOutput);
        }
        Ok(())
    }

    /// Time zone timestamps are rendered in
    pub fn display_zone(&self) -> DisplayZone {
        if self.utc_time {
            DisplayZone::Utc
        } else {
            DisplayZone::Local
        }
    }

    pub fn timestamp_format(&self) -> TimestampFormat {
        TimestampFormat::new(self.display_zone(), self.show_millis)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Apply `STAMPLOG_LEVEL`, `STAMPLOG_UTC` and `STAMPLOG_FILE`
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(level) = lookup(ENV_LEVEL) {
            self.level = level.parse()?;
        }
        if let Some(utc) = lookup(ENV_UTC) {
            self.utc_time = utc == "1" || utc.eq_ignore_ascii_case("true");
        }
        if let Some(file) = lookup(ENV_FILE).filter(|f| !f.trim().is_empty()) {
            self.filename = Some(PathBuf::from(file));
        }
        Ok(self)
    }
}
