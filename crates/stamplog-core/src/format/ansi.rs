//! ANSI escape handling

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

// CSI sequences (colors, cursor movement) and OSC sequences (hyperlinks, titles)
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
        .expect("valid ANSI regex")
});

pub const RESET: &str = "\x1b[0m";
pub const GREY: &str = "\x1b[90m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";

/// Remove terminal escape sequences from text
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    ANSI_ESCAPE.replace_all(text, "")
}
