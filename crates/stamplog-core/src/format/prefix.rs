//! Line prefix construction

use rand::Rng;

use super::timestamp::TimestampFormat;
use crate::types::LogValue;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of auto-generated instance ids
pub const AUTO_ID_LEN: usize = 4;

/// Generate a random lowercase base-36 instance id
pub fn generate_instance_id() -> String {
    let mut rng = rand::rng();
    (0..AUTO_ID_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Builds the `[timestamp] [id]` prefix for each line
#[derive(Debug, Clone)]
pub struct PrefixBuilder {
    format: TimestampFormat,
    instance_id: Option<String>,
}

impl PrefixBuilder {
    pub fn new(format: TimestampFormat, instance_id: Option<String>) -> Self {
        Self { format, instance_id }
    }

    /// The instance id appended after the timestamp, if any
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    /// The bracketed current time, e.g. `[2024-01-31 12:00:00]`
    pub fn timestamp(&self) -> String {
        self.format.bracketed_now()
    }

    /// Compute the prefix for a call.
    ///
    /// A run of `\n` at the start of a leading string value is removed from
    /// the value and placed before the timestamp instead. Only the first
    /// value is inspected.
    pub fn build(&self, values: &mut [LogValue]) -> String {
        let newlines = match values.first_mut() {
            Some(LogValue::String(first)) => take_leading_newlines(first),
            _ => String::new(),
        };

        let mut prefix = newlines + &self.timestamp();
        if let Some(id) = &self.instance_id {
            prefix.push_str(" [");
            prefix.push_str(id);
            prefix.push(']');
        }
        prefix
    }
}

fn take_leading_newlines(text: &mut String) -> String {
    let count = text.bytes().take_while(|b| *b == b'\n').count();
    text.drain(..count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::timestamp::DisplayZone;
    use regex::Regex;

    fn builder(id: Option<&str>) -> PrefixBuilder {
        PrefixBuilder::new(
            TimestampFormat::new(DisplayZone::Utc, false),
            id.map(str::to_string),
        )
    }

    #[test]
    fn test_leading_newlines_move_before_timestamp() {
        let mut values = vec![LogValue::from("\n\n\nStarting")];
        let prefix = builder(None).build(&mut values);

        let re = Regex::new(r"^\n\n\n\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\]$").unwrap();
        assert!(re.is_match(&prefix), "unexpected prefix {:?}", prefix);
        assert_eq!(values[0], LogValue::from("Starting"));
    }

    #[test]
    fn test_interior_newlines_untouched() {
        let mut values = vec![LogValue::from("a\nb"), LogValue::from("\nsecond")];
        let prefix = builder(None).build(&mut values);

        assert!(prefix.starts_with('['));
        assert_eq!(values[0], LogValue::from("a\nb"));
        assert_eq!(values[1], LogValue::from("\nsecond"));
    }

    #[test]
    fn test_non_string_first_value() {
        let mut values = vec![LogValue::Integer(1), LogValue::from("\nx")];
        let prefix = builder(None).build(&mut values);
        assert!(prefix.starts_with('['));
        assert_eq!(values[1], LogValue::from("\nx"));
    }

    #[test]
    fn test_literal_id() {
        let mut values = vec![LogValue::from("hi")];
        let prefix = builder(Some("foo")).build(&mut values);
        assert!(prefix.ends_with(" [foo]"));
    }

    #[test]
    fn test_timestamp_excludes_id() {
        let ts = builder(Some("foo")).timestamp();
        assert!(ts.starts_with('[') && ts.ends_with(']'));
        assert!(!ts.contains("foo"));
    }

    #[test]
    fn test_empty_values() {
        let mut values: Vec<LogValue> = vec![];
        assert!(builder(None).build(&mut values).starts_with('['));
    }

    #[test]
    fn test_generated_id_shape() {
        let re = Regex::new(r"^[0-9a-z]{4}$").unwrap();
        for _ in 0..50 {
            assert!(re.is_match(&generate_instance_id()));
        }
    }
}
