//! File rendering of log values
//!
//! Values are written the way they would look in a full, pretty JSON dump,
//! with a few departures that mimic what people expect from a console:
//! - top-level strings are written raw and `undefined` as a bare word
//! - nested `undefined` becomes the string `"undefined"` and keys are kept
//! - dates use the normalized local representation
//! - big integers are written as plain numbers (lossy above 2^53)
//! - stack traces keep real line breaks, which makes the JSON invalid for
//!   that one field but keeps the trace readable
//! - terminal escape sequences are stripped from all text

use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::ansi::strip_ansi;
use super::timestamp::TimestampFormat;
use crate::types::{ErrorValue, LogValue};

const INDENT: &[u8] = b"    ";

/// 2^63 and 2^64, the exclusive upper bounds of `i64` and `u64` as `f64`
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// Serializes log values for the file sink
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSerializer {
    dates: TimestampFormat,
}

impl ValueSerializer {
    pub fn new(dates: TimestampFormat) -> Self {
        Self { dates }
    }

    /// Serialize every value and join them with single spaces
    pub fn serialize_values(&self, values: &[LogValue]) -> String {
        values
            .iter()
            .map(|value| self.serialize(value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialize a single top-level value
    pub fn serialize(&self, value: &LogValue) -> String {
        match value {
            LogValue::String(s) => text(s),
            LogValue::Undefined => "undefined".to_string(),
            LogValue::BigInt(n) => bigint_to_json(*n).to_string(),
            other => {
                let mut stacks = Vec::new();
                let json = self.to_json(other, &mut stacks);
                restore_stacks(to_pretty(&json), &stacks)
            }
        }
    }

    fn to_json(&self, value: &LogValue, stacks: &mut Vec<String>) -> Value {
        match value {
            LogValue::Undefined => Value::String("undefined".to_string()),
            LogValue::Null => Value::Null,
            LogValue::Bool(b) => Value::Bool(*b),
            LogValue::Number(n) => number_to_json(*n),
            LogValue::Integer(i) => Value::from(*i),
            LogValue::BigInt(i) => bigint_to_json(*i),
            LogValue::String(s) => Value::String(text(s)),
            LogValue::Date(date) => Value::String(self.dates.format_instant(*date)),
            LogValue::Error(err) => self.error_to_json(err, stacks),
            LogValue::Array(items) | LogValue::Set(items) => {
                Value::Array(items.iter().map(|item| self.to_json(item, stacks)).collect())
            }
            LogValue::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let value = self.to_json(value, stacks);
                    map.insert(self.map_key(key), value);
                }
                Value::Object(map)
            }
            LogValue::Object(fields) => {
                let error_like = value.is_error_like();
                let mut map = Map::new();
                for (key, value) in fields {
                    let value = match value {
                        LogValue::String(stack) if error_like && key == "stack" => {
                            stack_placeholder(stack, stacks)
                        }
                        other => self.to_json(other, stacks),
                    };
                    map.insert(text(key), value);
                }
                Value::Object(map)
            }
        }
    }

    fn error_to_json(&self, err: &ErrorValue, stacks: &mut Vec<String>) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(text(&err.name)));
        map.insert("message".to_string(), Value::String(text(&err.message)));
        if let Some(stack) = &err.stack {
            map.insert("stack".to_string(), stack_placeholder(stack, stacks));
        }
        if let Some(cause) = &err.cause {
            map.insert("cause".to_string(), self.to_json(cause, stacks));
        }
        Value::Object(map)
    }

    fn map_key(&self, key: &LogValue) -> String {
        match key {
            LogValue::String(s) => text(s),
            other => self.serialize(other),
        }
    }
}

fn text(s: &str) -> String {
    strip_ansi(s).into_owned()
}

/// Integral values inside the 64-bit range are written as exact integers,
/// everything else as a float (or `null` when not finite)
fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 {
        if (-I64_BOUND..I64_BOUND).contains(&n) {
            return Value::from(n as i64);
        }
        if (0.0..U64_BOUND).contains(&n) {
            return Value::from(n as u64);
        }
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Big integers are coerced to an ordinary number first, top-level or nested
fn bigint_to_json(n: i128) -> Value {
    number_to_json(n as f64)
}

fn stack_placeholder(stack: &str, stacks: &mut Vec<String>) -> Value {
    let placeholder = placeholder_for(stacks.len());
    stacks.push(text(stack));
    Value::String(placeholder)
}

fn placeholder_for(index: usize) -> String {
    format!("\u{1}stamplog-stack-{}\u{1}", index)
}

fn to_pretty(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

/// Swap each placeholder for its stack as a JSON string whose `\n` escapes
/// are turned back into real line breaks
fn restore_stacks(mut rendered: String, stacks: &[String]) -> String {
    for (index, stack) in stacks.iter().enumerate() {
        let token = Value::String(placeholder_for(index)).to_string();
        let readable = unescape_newlines(&Value::String(stack.clone()).to_string());
        rendered = rendered.replacen(&token, &readable, 1);
    }
    rendered
}

fn unescape_newlines(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}
