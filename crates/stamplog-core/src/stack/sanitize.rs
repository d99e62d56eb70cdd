//! Stack sanitizing over arbitrary value graphs
//!
//! Walks the values of a log call and cleans every stack trace it finds.
//! The walk consumes the values and returns the cleaned copies, so a caller
//! that kept its own clone still has the original stack text.

use super::traits::{CleanError, CleanResult, StackCleaner};
use crate::types::LogValue;

/// Applies a `StackCleaner` to every error-like value in a structure
pub struct Sanitizer<'a, W>
where
    W: FnMut(CleanError),
{
    cleaner: &'a dyn StackCleaner,
    on_warning: W,
}

impl<'a, W> Sanitizer<'a, W>
where
    W: FnMut(CleanError),
{
    /// Create a sanitizer. Non-fatal cleaning failures are passed to
    /// `on_warning` and leave the affected stack untouched.
    pub fn new(cleaner: &'a dyn StackCleaner, on_warning: W) -> Self {
        Self { cleaner, on_warning }
    }

    /// Sanitize every value of a call
    pub fn sanitize_all(&mut self, values: Vec<LogValue>) -> CleanResult<Vec<LogValue>> {
        values.into_iter().map(|value| self.sanitize(value)).collect()
    }

    /// Sanitize one value.
    ///
    /// Error-like values are terminal: their stack is cleaned and their other
    /// fields are not visited. Dates and scalars are returned as they are.
    pub fn sanitize(&mut self, value: LogValue) -> CleanResult<LogValue> {
        match value {
            LogValue::Error(mut err) => {
                if let Some(stack) = err.stack.take() {
                    err.stack = Some(self.clean_or_keep(stack)?);
                }
                Ok(LogValue::Error(err))
            }
            LogValue::Object(fields) if has_stack_field(&fields) => {
                let fields = fields
                    .into_iter()
                    .map(|(key, value)| match value {
                        LogValue::String(stack) if key == "stack" => {
                            Ok((key, LogValue::String(self.clean_or_keep(stack)?)))
                        }
                        other => Ok((key, other)),
                    })
                    .collect::<CleanResult<Vec<_>>>()?;
                Ok(LogValue::Object(fields))
            }
            LogValue::Object(fields) => {
                let fields = fields
                    .into_iter()
                    .map(|(key, value)| Ok((key, self.sanitize(value)?)))
                    .collect::<CleanResult<Vec<_>>>()?;
                Ok(LogValue::Object(fields))
            }
            LogValue::Array(items) => Ok(LogValue::Array(self.sanitize_all(items)?)),
            LogValue::Set(items) => Ok(LogValue::Set(self.sanitize_all(items)?)),
            LogValue::Map(entries) => {
                let entries = entries
                    .into_iter()
                    .map(|(key, value)| Ok((key, self.sanitize(value)?)))
                    .collect::<CleanResult<Vec<_>>>()?;
                Ok(LogValue::Map(entries))
            }
            leaf => Ok(leaf),
        }
    }

    fn clean_or_keep(&mut self, stack: String) -> CleanResult<String> {
        match self.cleaner.clean(&stack) {
            Ok(cleaned) => Ok(cleaned),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                (self.on_warning)(err);
                Ok(stack)
            }
        }
    }
}

fn has_stack_field(fields: &[(String, LogValue)]) -> bool {
    fields
        .iter()
        .any(|(k, v)| k == "stack" && matches!(v, LogValue::String(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorValue;
    use chrono::{TimeZone, Utc};

    fn marker(stack: &str) -> CleanResult<String> {
        Ok(format!("clean({})", stack))
    }

    fn sanitize(value: LogValue) -> LogValue {
        let cleaner = marker;
        let mut sanitizer = Sanitizer::new(&cleaner, |err| panic!("unexpected warning: {}", err));
        sanitizer.sanitize(value).unwrap()
    }

    fn err(stack: &str) -> LogValue {
        LogValue::Error(ErrorValue::new("Error", "boom").with_stack(stack))
    }

    #[test]
    fn test_top_level_error() {
        match sanitize(err("s")) {
            LogValue::Error(e) => assert_eq!(e.stack.as_deref(), Some("clean(s)")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_containers() {
        let value = LogValue::object([
            ("list", LogValue::array([err("a")])),
            ("set", LogValue::set([err("b")])),
            ("map", LogValue::map([("k", err("c"))])),
        ]);

        let text = format!("{:?}", sanitize(value));
        assert!(text.contains("clean(a)"));
        assert!(text.contains("clean(b)"));
        assert!(text.contains("clean(c)"));
    }

    #[test]
    fn test_duck_typed_object_is_terminal() {
        let value = LogValue::object([
            ("stack", LogValue::from("s")),
            ("inner", err("nested")),
        ]);

        match sanitize(value) {
            LogValue::Object(fields) => {
                assert_eq!(fields[0].1, LogValue::from("clean(s)"));
                assert_eq!(fields[1].1, err("nested"));
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_error_cause_not_descended() {
        let value = LogValue::Error(
            ErrorValue::new("Outer", "o")
                .with_stack("s")
                .with_cause(err("inner")),
        );
        match sanitize(value) {
            LogValue::Error(e) => assert_eq!(e.cause.as_deref(), Some(&err("inner"))),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_leaves_untouched() {
        let date = LogValue::from(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(sanitize(date.clone()), date);
        assert_eq!(sanitize(LogValue::from("stack")), LogValue::from("stack"));
    }

    #[test]
    fn test_transient_failure_keeps_stack() {
        let failing =
            |_: &str| -> CleanResult<String> { Err(CleanError::Other("read-only".into())) };
        let mut warnings = Vec::new();
        let result = Sanitizer::new(&failing, |e| warnings.push(e)).sanitize(err("orig")).unwrap();

        assert_eq!(result, err("orig"));
        assert_eq!(warnings, vec![CleanError::Other("read-only".into())]);
    }

    #[test]
    fn test_fatal_failure_propagates() {
        let failing = |_: &str| -> CleanResult<String> { Err(CleanError::HomeDirUnavailable) };
        let result =
            Sanitizer::new(&failing, |_| {}).sanitize_all(vec![LogValue::array([err("x")])]);
        assert_eq!(result, Err(CleanError::HomeDirUnavailable));
    }

    #[test]
    fn test_original_clone_unaffected() {
        let original = err("orig");
        let _ = sanitize(original.clone());
        assert_eq!(original, err("orig"));
    }
}
