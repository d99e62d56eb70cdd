//! Loggable values
//!
//! A log call carries an ordered list of heterogeneous values. `LogValue` is
//! the closed set of shapes the formatter understands: JSON-like scalars and
//! containers, plus dates, big integers, sets/maps and error-like values.

use std::backtrace::Backtrace;
use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// A single argument of a log call
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    /// Absent value
    Undefined,
    Null,
    Bool(bool),
    /// Floating point number
    Number(f64),
    /// Integer that fits the ordinary numeric range
    Integer(i64),
    /// Arbitrary-width integer. Serialized as an ordinary number, which loses
    /// precision above 2^53.
    BigInt(i128),
    String(String),
    Date(DateTime<Utc>),
    Error(ErrorValue),
    Array(Vec<LogValue>),
    Set(Vec<LogValue>),
    /// Ordered key/value container with arbitrary keys
    Map(Vec<(LogValue, LogValue)>),
    /// Ordered string-keyed record
    Object(Vec<(String, LogValue)>),
}

impl LogValue {
    /// Build an object from `(key, value)` pairs, keeping their order
    pub fn object<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<LogValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        LogValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Build an array
    pub fn array<V, I>(items: I) -> Self
    where
        V: Into<LogValue>,
        I: IntoIterator<Item = V>,
    {
        LogValue::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a set
    pub fn set<V, I>(items: I) -> Self
    where
        V: Into<LogValue>,
        I: IntoIterator<Item = V>,
    {
        LogValue::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build a map
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<LogValue>,
        V: Into<LogValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        LogValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Wrap a big integer
    pub fn bigint(value: i128) -> Self {
        LogValue::BigInt(value)
    }

    /// Capture a Rust error, including its source chain and a backtrace
    pub fn error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        LogValue::Error(ErrorValue::from_error(err))
    }

    /// Whether this value carries a stack trace (error variant, or an object
    /// with a string `stack` field)
    pub fn is_error_like(&self) -> bool {
        match self {
            LogValue::Error(_) => true,
            LogValue::Object(fields) => fields
                .iter()
                .any(|(k, v)| k == "stack" && matches!(v, LogValue::String(_))),
            _ => false,
        }
    }
}

/// Plain representation of an error: name, message, stack and cause
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
    pub cause: Option<Box<LogValue>>,
}

impl ErrorValue {
    /// Create an error value without a stack
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
            cause: None,
        }
    }

    /// Attach stack text
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attach a cause
    pub fn with_cause(mut self, cause: impl Into<LogValue>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }

    /// Capture an error with a backtrace taken at the call site.
    ///
    /// The stack text starts with a `Name: message` header line followed by
    /// the backtrace frames. Sources are captured as nested causes without
    /// their own backtrace.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let name = short_type_name(std::any::type_name::<E>());
        let message = err.to_string();
        let backtrace = Backtrace::force_capture();
        let stack = format!("{}: {}\n{}", name, message, backtrace);

        let mut value = Self::new(name, message).with_stack(stack);
        if let Some(source) = err.source() {
            value.cause = Some(Box::new(LogValue::Error(Self::from_source(source))));
        }
        value
    }

    fn from_source(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut value = Self::new("Error", err.to_string());
        if let Some(source) = err.source() {
            value.cause = Some(Box::new(LogValue::Error(Self::from_source(source))));
        }
        value
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stack {
            Some(stack) => f.write_str(stack),
            None if self.message.is_empty() => f.write_str(&self.name),
            None => write!(f, "{}: {}", self.name, self.message),
        }
    }
}

/// `my_crate::io::ReadError<T>` -> `ReadError`
fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    let name = base.rsplit("::").next().unwrap_or(base).trim();
    let name = name.trim_start_matches("dyn ");
    if name.is_empty() {
        "Error".to_string()
    } else {
        name.to_string()
    }
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::String(s.to_string())
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::String(s)
    }
}

impl From<&String> for LogValue {
    fn from(s: &String) -> Self {
        LogValue::String(s.clone())
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for LogValue {
                fn from(n: $t) -> Self {
                    LogValue::Integer(n as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for LogValue {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => LogValue::Integer(n),
            Err(_) => LogValue::BigInt(n as i128),
        }
    }
}

impl From<usize> for LogValue {
    fn from(n: usize) -> Self {
        LogValue::from(n as u64)
    }
}

impl From<i128> for LogValue {
    fn from(n: i128) -> Self {
        LogValue::BigInt(n)
    }
}

impl From<f32> for LogValue {
    fn from(n: f32) -> Self {
        LogValue::Number(n as f64)
    }
}

impl From<f64> for LogValue {
    fn from(n: f64) -> Self {
        LogValue::Number(n)
    }
}

impl From<()> for LogValue {
    fn from(_: ()) -> Self {
        LogValue::Undefined
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for LogValue {
    fn from(date: DateTime<Tz>) -> Self {
        LogValue::Date(date.with_timezone(&Utc))
    }
}

impl From<ErrorValue> for LogValue {
    fn from(err: ErrorValue) -> Self {
        LogValue::Error(err)
    }
}

impl<T: Into<LogValue>> From<Option<T>> for LogValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(LogValue::Undefined)
    }
}

impl<T: Into<LogValue>> From<Vec<T>> for LogValue {
    fn from(items: Vec<T>) -> Self {
        LogValue::array(items)
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => LogValue::Null,
            Value::Bool(b) => LogValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    LogValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    LogValue::BigInt(u as i128)
                } else {
                    LogValue::Number(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => LogValue::String(s),
            Value::Array(items) => LogValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(fields) => {
                LogValue::Object(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Console rendering, modelled on interactive inspection: a top-level string
/// prints raw, nested strings are single-quoted.
impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::String(s) => f.write_str(s),
            LogValue::Error(err) => write!(f, "{}", err),
            other => fmt_nested(other, f),
        }
    }
}

fn fmt_nested(value: &LogValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        LogValue::Undefined => f.write_str("undefined"),
        LogValue::Null => f.write_str("null"),
        LogValue::Bool(b) => write!(f, "{}", b),
        LogValue::Number(n) => f.write_str(&format_number(*n)),
        LogValue::Integer(i) => write!(f, "{}", i),
        LogValue::BigInt(i) => write!(f, "{}n", i),
        LogValue::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
        LogValue::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        LogValue::Error(err) => write!(f, "[{}: {}]", err.name, err.message),
        LogValue::Array(items) => fmt_list(f, "", "[", "]", items.iter().map(Entry::Value)),
        LogValue::Set(items) => {
            let label = format!("Set({}) ", items.len());
            fmt_list(f, &label, "{", "}", items.iter().map(Entry::Value))
        }
        LogValue::Map(entries) => {
            let label = format!("Map({}) ", entries.len());
            fmt_list(f, &label, "{", "}", entries.iter().map(|(k, v)| Entry::Pair(k, v)))
        }
        LogValue::Object(fields) => {
            fmt_list(f, "", "{", "}", fields.iter().map(|(k, v)| Entry::Field(k, v)))
        }
    }
}

enum Entry<'a> {
    Value(&'a LogValue),
    Pair(&'a LogValue, &'a LogValue),
    Field(&'a str, &'a LogValue),
}

fn fmt_list<'a>(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    open: &str,
    close: &str,
    entries: impl ExactSizeIterator<Item = Entry<'a>>,
) -> fmt::Result {
    f.write_str(label)?;
    if entries.len() == 0 {
        return write!(f, "{}{}", open, close);
    }
    write!(f, "{} ", open)?;
    for (i, entry) in entries.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match entry {
            Entry::Value(v) => fmt_nested(v, f)?,
            Entry::Pair(k, v) => {
                fmt_nested(k, f)?;
                f.write_str(" => ")?;
                fmt_nested(v, f)?;
            }
            Entry::Field(k, v) => {
                write!(f, "{}: ", k)?;
                fmt_nested(v, f)?;
            }
        }
    }
    write!(f, " {}", close)
}

/// Integral floats print without a fraction, like a scripting console would
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk on fire")
        }
    }

    impl std::error::Error for Inner {}

    #[derive(Debug)]
    struct WriteFailed(Inner);

    impl fmt::Display for WriteFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("write failed")
        }
    }

    impl std::error::Error for WriteFailed {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(LogValue::from("a"), LogValue::String("a".into()));
        assert_eq!(LogValue::from(3u8), LogValue::Integer(3));
        assert_eq!(LogValue::from(u64::MAX), LogValue::BigInt(u64::MAX as i128));
        assert_eq!(LogValue::from(None::<i32>), LogValue::Undefined);
        assert_eq!(
            LogValue::from(vec![1, 2]),
            LogValue::Array(vec![LogValue::Integer(1), LogValue::Integer(2)])
        );
    }

    #[test]
    fn test_from_json_keeps_field_order() {
        let json = serde_json::json!({"zeta": 1, "alpha": [true, null]});
        let value = LogValue::from(json);
        match value {
            LogValue::Object(fields) => {
                assert_eq!(fields[0].0, "zeta");
                assert_eq!(
                    fields[1].1,
                    LogValue::Array(vec![LogValue::Bool(true), LogValue::Null])
                );
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_error_capture() {
        let err = WriteFailed(Inner);
        let value = ErrorValue::from_error(&err);
        assert_eq!(value.name, "WriteFailed");
        assert_eq!(value.message, "write failed");
        assert!(value.stack.as_deref().unwrap().starts_with("WriteFailed: write failed\n"));

        match value.cause.as_deref() {
            Some(LogValue::Error(cause)) => {
                assert_eq!(cause.message, "disk on fire");
                assert!(cause.stack.is_none());
            }
            other => panic!("expected cause, got {:?}", other),
        }
    }

    #[test]
    fn test_error_like_detection() {
        assert!(LogValue::Error(ErrorValue::new("E", "m")).is_error_like());
        assert!(LogValue::object([("stack", "E: m")]).is_error_like());
        assert!(!LogValue::object([("stack", 1)]).is_error_like());
        assert!(!LogValue::from("stack").is_error_like());
    }

    #[test]
    fn test_display() {
        assert_eq!(LogValue::from("raw text").to_string(), "raw text");
        assert_eq!(LogValue::Number(2.0).to_string(), "2");
        assert_eq!(LogValue::Number(2.5).to_string(), "2.5");
        assert_eq!(LogValue::bigint(10).to_string(), "10n");
        assert_eq!(LogValue::array(["a", "b"]).to_string(), "[ 'a', 'b' ]");
        assert_eq!(LogValue::object([("a", 1)]).to_string(), "{ a: 1 }");
        assert_eq!(LogValue::set([1, 2]).to_string(), "Set(2) { 1, 2 }");
        assert_eq!(LogValue::map([("k", true)]).to_string(), "Map(1) { 'k' => true }");
        assert_eq!(LogValue::Array(vec![]).to_string(), "[]");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("my_crate::io::ReadError<u8>"), "ReadError");
        assert_eq!(short_type_name("dyn core::error::Error"), "Error");
    }
}
