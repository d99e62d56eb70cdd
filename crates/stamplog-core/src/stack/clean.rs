//! Default stack cleaning
//!
//! Removes frames that belong to the language runtime rather than to the
//! program being debugged, and optionally shortens file paths:
//! - `base_path`: strip a project root (with or without a `file://` scheme)
//! - `pretty`: replace the home directory with `~`
//!
//! Both JavaScript-style stacks (`    at fn (file.js:1:2)`) and Rust
//! backtraces (`   3: crate::fn` followed by `at src/x.rs:1:2`) are understood.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::traits::{CleanError, CleanResult, StackCleaner};

// Location part of a JavaScript-style frame, or of a Rust `at` line
static FRAME_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+at.*[(\s](.*?)\)?$").expect("valid frame regex"));

static JS_INTERNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^(?:
            (?:
                (?:
                    node
                    | node:[\w/]+
                    | (?:
                        (?:node:)?internal/[\w/]*
                        | .*node_modules/(?:babel-polyfill|pirates)/.*
                    )?\w+
                )
                (?:\.js)?:\d+:\d+
            )
            | native
        )",
    )
    .expect("valid internal frame regex")
});

static RUST_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+:\s+(.+)$").expect("valid symbol regex"));

static RUST_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+at\s+(.+)$").expect("valid location regex"));

static RUST_INTERNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^(?:
            <?(?:std|core|alloc|backtrace|test|tokio::runtime|stamplog_core::types)::
            | <F\x20as\x20core::
            | rust_begin_unwind | __rust_ | __libc_start | _start$ | main$ | __scrt_
            | BaseThreadInitThunk | RtlUserThreadStart | start_thread | clone3?$
        )",
    )
    .expect("valid runtime symbol regex")
});

const ELECTRON_BUNDLES: [&str; 4] = [
    ".app/Contents/Resources/electron.asar",
    ".app/Contents/Resources/default_app.asar",
    "node_modules/electron/dist/resources/electron.asar",
    "node_modules/electron/dist/resources/default_app.asar",
];

/// Predicate deciding whether a frame whose location is `path` is kept
pub type PathFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options for the default stack cleaner
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleanStackOptions {
    /// Replace the home directory with `~`
    pub pretty: bool,

    /// Strip this directory from frame paths
    pub base_path: Option<PathBuf>,

    /// Extra frame filter; frames whose path it rejects are removed
    #[serde(skip)]
    pub path_filter: Option<PathFilter>,
}

impl CleanStackOptions {
    /// The options used when cleaning is simply switched on
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_path_filter(
        mut self,
        filter: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.path_filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for CleanStackOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanStackOptions")
            .field("pretty", &self.pretty)
            .field("base_path", &self.base_path)
            .field("path_filter", &self.path_filter.is_some())
            .finish()
    }
}

impl PartialEq for CleanStackOptions {
    fn eq(&self, other: &Self) -> bool {
        self.pretty == other.pretty
            && self.base_path == other.base_path
            && self.path_filter.is_none()
            && other.path_filter.is_none()
    }
}

#[derive(Debug, Clone)]
enum HomeSource {
    System,
    Fixed(Option<PathBuf>),
}

/// Stack cleaner that drops runtime frames and shortens paths
#[derive(Debug, Clone)]
pub struct DefaultStackCleaner {
    options: CleanStackOptions,
    home: HomeSource,
}

impl DefaultStackCleaner {
    /// Create a cleaner that resolves the home directory from the system
    pub fn new(options: CleanStackOptions) -> Self {
        Self {
            options,
            home: HomeSource::System,
        }
    }

    /// Use `home` instead of asking the system. `None` behaves like a system
    /// without a resolvable home directory.
    pub fn with_home_dir(mut self, home: Option<PathBuf>) -> Self {
        self.home = HomeSource::Fixed(home);
        self
    }

    pub fn options(&self) -> &CleanStackOptions {
        &self.options
    }

    fn home_dir(&self) -> CleanResult<String> {
        let home = match &self.home {
            HomeSource::System => dirs::home_dir(),
            HomeSource::Fixed(home) => home.clone(),
        };
        let home = home.ok_or(CleanError::HomeDirUnavailable)?;
        path_text(&home)
    }

    fn keep_js_line(&self, line: &str) -> bool {
        let Some(location) = location_of(line) else {
            return true;
        };
        if ELECTRON_BUNDLES.iter().any(|bundle| location.contains(bundle)) {
            return false;
        }
        !JS_INTERNAL.is_match(location) && self.passes_filter(location)
    }

    fn keep_rust_frame(&self, symbol: &str, locations: &[&str]) -> bool {
        if RUST_INTERNAL.is_match(symbol.trim()) {
            return false;
        }
        locations.iter().all(|line| {
            let path = RUST_LOCATION
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .unwrap_or_default();
            !path.starts_with("/rustc/") && self.passes_filter(path)
        })
    }

    fn passes_filter(&self, path: &str) -> bool {
        self.options
            .path_filter
            .as_ref()
            .map(|filter| filter(path))
            .unwrap_or(true)
    }

    fn rewrite(&self, line: &str, base: Option<&str>, home: Option<&str>) -> String {
        let mut line = line.to_string();

        if let Some(base) = base {
            for pattern in [
                format!("file://{}/", base),
                format!("file://{}", base),
                format!("{}/", base),
                base.to_string(),
            ] {
                line = line.replace(&pattern, "");
            }
        }

        if let Some(home) = home {
            if let Some(m) = FRAME_LOCATION.captures(&line).and_then(|caps| caps.get(1)) {
                let shortened = m.as_str().replacen(home, "~", 1);
                line = format!("{}{}{}", &line[..m.start()], shortened, &line[m.end()..]);
            }
        }

        line
    }
}

impl Default for DefaultStackCleaner {
    fn default() -> Self {
        Self::new(CleanStackOptions::pretty())
    }
}

impl StackCleaner for DefaultStackCleaner {
    fn name(&self) -> &str {
        "default"
    }

    fn clean(&self, stack: &str) -> CleanResult<String> {
        let home = if self.options.pretty {
            Some(self.home_dir()?)
        } else {
            None
        };
        let base = self.options.base_path.as_deref().map(path_text).transpose()?;
        let base = base.as_deref().map(|b| b.trim_end_matches('/')).filter(|b| !b.is_empty());

        let normalized = stack.replace('\\', "/");
        let lines: Vec<&str> = normalized.lines().collect();
        let mut kept: Vec<&str> = Vec::with_capacity(lines.len());

        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];

            if let Some(caps) = RUST_SYMBOL.captures(line) {
                let mut end = i + 1;
                while end < lines.len() && RUST_LOCATION.is_match(lines[end]) {
                    end += 1;
                }
                if self.keep_rust_frame(&caps[1], &lines[i + 1..end]) {
                    kept.extend_from_slice(&lines[i..end]);
                }
                i = end;
                continue;
            }

            if self.keep_js_line(line) {
                kept.push(line);
            }
            i += 1;
        }

        let cleaned: Vec<String> = kept
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.rewrite(line, base, home.as_deref()))
            .collect();

        Ok(cleaned.join("\n"))
    }
}

fn location_of(line: &str) -> Option<&str> {
    FRAME_LOCATION
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

fn path_text(path: &Path) -> CleanResult<String> {
    path.to_str()
        .map(|s| s.replace('\\', "/"))
        .ok_or_else(|| CleanError::Other(format!("path is not valid UTF-8: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JS_STACK: &str = "Error: boom
    at Object.<anonymous> (/home/alice/project/src/app.js:4:9)
    at Module._compile (node:internal/modules/cjs/loader:1105:14)
    at node:internal/main/run_main_module:17:47
    at processTicksAndRejections (internal/process/task_queues.js:95:5)
    at run (/home/alice/project/lib/run.js:10:3)
    at new Promise (<anonymous>)
    at Array.forEach (native)";

    const RUST_STACK: &str = "Failed: boom
   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc123/library/std/src/backtrace.rs:312:9
   1: stamplog_core::types::value::ErrorValue::from_error
             at /home/alice/.cargo/registry/src/stamplog-core/src/types/value.rs:140:25
   2: myapp::load_config
             at /home/alice/project/src/main.rs:22:17
   3: myapp::main
             at /home/alice/project/src/main.rs:8:5
   4: core::ops::function::FnOnce::call_once
             at /rustc/abc123/library/core/src/ops/function.rs:250:5
   5: main
   6: __libc_start_main";

    fn cleaner(options: CleanStackOptions) -> DefaultStackCleaner {
        DefaultStackCleaner::new(options).with_home_dir(Some(PathBuf::from("/home/alice")))
    }

    #[test]
    fn test_js_internal_frames_removed() {
        let cleaned = cleaner(CleanStackOptions::default()).clean(JS_STACK).unwrap();
        assert_eq!(
            cleaned,
            "Error: boom
    at Object.<anonymous> (/home/alice/project/src/app.js:4:9)
    at run (/home/alice/project/lib/run.js:10:3)
    at new Promise (<anonymous>)"
        );
    }

    #[test]
    fn test_js_pretty_paths() {
        let cleaned = cleaner(CleanStackOptions::pretty()).clean(JS_STACK).unwrap();
        assert!(cleaned.contains("(~/project/src/app.js:4:9)"));
        assert!(!cleaned.contains("/home/alice"));
    }

    #[test]
    fn test_base_path_removed() {
        let options = CleanStackOptions::default().with_base_path("/home/alice/project");
        let cleaned = cleaner(options).clean(JS_STACK).unwrap();
        assert!(cleaned.contains("(src/app.js:4:9)"));
        assert!(cleaned.contains("(lib/run.js:10:3)"));
    }

    #[test]
    fn test_base_path_with_file_scheme() {
        let stack = "Error: x\n    at f (file:///srv/app/index.js:1:1)";
        let options = CleanStackOptions::default().with_base_path("/srv/app/");
        let cleaned = cleaner(options).clean(stack).unwrap();
        assert_eq!(cleaned, "Error: x\n    at f (index.js:1:1)");
    }

    #[test]
    fn test_rust_runtime_frames_removed() {
        let cleaned = cleaner(CleanStackOptions::pretty()).clean(RUST_STACK).unwrap();
        assert_eq!(
            cleaned,
            "Failed: boom
   2: myapp::load_config
             at ~/project/src/main.rs:22:17
   3: myapp::main
             at ~/project/src/main.rs:8:5"
        );
    }

    #[test]
    fn test_path_filter() {
        let options = CleanStackOptions::default().with_path_filter(|path| !path.contains("/lib/"));
        let cleaned = cleaner(options).clean(JS_STACK).unwrap();
        assert!(cleaned.contains("app.js"));
        assert!(!cleaned.contains("run.js"));
    }

    #[test]
    fn test_windows_separators_normalized() {
        let stack = "Error: x\n    at f (C:\\work\\app\\index.js:1:1)";
        let options = CleanStackOptions::default().with_base_path("C:\\work\\app");
        let cleaned = cleaner(options).clean(stack).unwrap();
        assert_eq!(cleaned, "Error: x\n    at f (index.js:1:1)");
    }

    #[test]
    fn test_missing_home_is_capability_error() {
        let cleaner = DefaultStackCleaner::new(CleanStackOptions::pretty()).with_home_dir(None);
        assert_eq!(cleaner.clean(JS_STACK), Err(CleanError::HomeDirUnavailable));
    }

    #[test]
    fn test_missing_home_ignored_without_pretty() {
        let options = CleanStackOptions::default().with_base_path("/home/alice/project");
        let cleaner = DefaultStackCleaner::new(options).with_home_dir(None);
        assert!(cleaner.clean(JS_STACK).is_ok());
    }

    #[test]
    fn test_blank_lines_dropped() {
        let cleaned = cleaner(CleanStackOptions::default())
            .clean("Error: x\n\n   \n    at f (/a.js:1:1)\n")
            .unwrap();
        assert_eq!(cleaned, "Error: x\n    at f (/a.js:1:1)");
    }
}
