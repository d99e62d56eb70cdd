//! Append-mode file sink
//!
//! Lines are handed to a dedicated writer thread so a log call never blocks
//! on disk I/O. `write` reports backpressure the way a byte stream does:
//! it returns `false` once the queued bytes reach the high-water mark, and
//! `drain()` waits until the queue falls back under it.
//!
//! Lines still queued when the process exits are lost unless `close()` was
//! awaited first. Dropping the sink ends the stream without waiting.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};

use super::traits::{report, SharedConsole};
use crate::format::TimestampFormat;
use crate::types::LogLevel;

/// Queued bytes at which `write` starts reporting backpressure
pub const HIGH_WATER_MARK: usize = 16 * 1024;

struct SinkState {
    pending: AtomicUsize,
    drained: Notify,
}

impl SinkState {
    fn below_mark(&self) -> bool {
        self.pending.load(Ordering::SeqCst) < HIGH_WATER_MARK
    }
}

/// File sink backed by a writer thread
pub struct FileSink {
    path: PathBuf,
    sender: Mutex<Option<mpsc::Sender<String>>>,
    closed: watch::Receiver<bool>,
    state: Arc<SinkState>,
    console: SharedConsole,
    format: TimestampFormat,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed.
    ///
    /// Write failures are reported on `console` and do not stop the sink.
    pub fn open(
        path: impl Into<PathBuf>,
        console: SharedConsole,
        format: TimestampFormat,
    ) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let (sender, receiver) = mpsc::channel();
        let (closed_tx, closed_rx) = watch::channel(false);
        let state = Arc::new(SinkState {
            pending: AtomicUsize::new(0),
            drained: Notify::new(),
        });

        let writer = Writer {
            file: BufWriter::new(file),
            path: path.clone(),
            state: state.clone(),
            console: console.clone(),
            format,
        };
        thread::Builder::new()
            .name("stamplog-file".to_string())
            .spawn(move || writer.run(receiver, closed_tx))?;

        Ok(Self {
            path,
            sender: Mutex::new(Some(sender)),
            closed: closed_rx,
            state,
            console,
            format,
        })
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes queued but not yet written
    pub fn pending_bytes(&self) -> usize {
        self.state.pending.load(Ordering::SeqCst)
    }

    /// Whether the sink still accepts lines
    pub fn is_open(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Queue a line. Returns `false` when the caller should `drain()` before
    /// writing more.
    pub fn write(&self, line: String) -> bool {
        let len = line.len();
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            report(
                self.console.as_ref(),
                &self.format,
                LogLevel::Warn,
                format!("Write to closed log file {} was dropped", self.path.display()),
            );
            return true;
        };

        let pending = self.state.pending.fetch_add(len, Ordering::SeqCst) + len;
        if sender.send(line).is_err() {
            self.state.pending.fetch_sub(len, Ordering::SeqCst);
            return true;
        }
        pending < HIGH_WATER_MARK
    }

    /// Wait until queued bytes fall below the high-water mark
    pub async fn drain(&self) {
        loop {
            let drained = self.state.drained.notified();
            if self.state.below_mark() {
                return;
            }
            drained.await;
        }
    }

    /// End the stream without waiting for buffered lines to be written
    pub fn end(&self) {
        self.sender.lock().take();
    }

    /// Flush everything queued and release the file. Every caller waits
    /// for the writer to finish, so concurrent and repeated calls are safe.
    pub async fn close(&self) {
        self.end();
        let mut closed = self.closed.clone();
        // An error means the writer is gone, which also means it is closed
        let _ = closed.wait_for(|done| *done).await;
    }
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("pending_bytes", &self.pending_bytes())
            .finish()
    }
}

struct Writer {
    file: BufWriter<File>,
    path: PathBuf,
    state: Arc<SinkState>,
    console: SharedConsole,
    format: TimestampFormat,
}

impl Writer {
    fn run(mut self, receiver: mpsc::Receiver<String>, closed: watch::Sender<bool>) {
        while let Ok(first) = receiver.recv() {
            let mut written = 0;
            let mut next = Some(first);
            while let Some(line) = next {
                written += line.len();
                if let Err(e) = self.file.write_all(line.as_bytes()) {
                    self.report_error(e);
                }
                next = receiver.try_recv().ok();
            }
            if let Err(e) = self.file.flush() {
                self.report_error(e);
            }

            let before = self.state.pending.fetch_sub(written, Ordering::SeqCst);
            if before - written < HIGH_WATER_MARK {
                self.state.drained.notify_waiters();
            }
        }

        if let Err(e) = self.file.flush() {
            self.report_error(e);
        }
        drop(self.file);
        self.state.pending.store(0, Ordering::SeqCst);
        self.state.drained.notify_waiters();
        closed.send_replace(true);
    }

    fn report_error(&self, err: io::Error) {
        report(
            self.console.as_ref(),
            &self.format,
            LogLevel::Error,
            format!("Error writing to log file {}: {}", self.path.display(), err),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{MemoryConsole, NoOpConsole};
    use std::fs;
    use tempfile::tempdir;

    fn open(path: &Path) -> FileSink {
        FileSink::open(path, Arc::new(NoOpConsole), TimestampFormat::default()).unwrap()
    }

    #[tokio::test]
    async fn test_write_and_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = open(&path);

        assert!(sink.write("first\n".to_string()));
        assert!(sink.write("second\n".to_string()));
        sink.close().await;

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert!(!sink.is_open());
        assert_eq!(sink.pending_bytes(), 0);
    }

    #[tokio::test]
    async fn test_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let sink = open(&path);
        sink.write("new\n".to_string());
        sink.close().await;

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[tokio::test]
    async fn test_close_twice_is_noop() {
        let dir = tempdir().unwrap();
        let sink = open(&dir.path().join("app.log"));
        sink.close().await;
        sink.close().await;
    }

    #[tokio::test]
    async fn test_concurrent_close_waits_for_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.log");
        let sink = open(&path);

        let line = format!("{}\n", "x".repeat(8 * 1024 * 1024));
        sink.write(line.clone());
        sink.write(line.clone());

        tokio::join!(
            async {
                sink.close().await;
                assert_eq!(fs::metadata(&path).unwrap().len() as usize, 2 * line.len());
            },
            async {
                sink.close().await;
                assert_eq!(fs::metadata(&path).unwrap().len() as usize, 2 * line.len());
            },
        );
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_write_errors_reported() {
        let console = Arc::new(MemoryConsole::new());
        let sink =
            FileSink::open("/dev/full", console.clone(), TimestampFormat::default()).unwrap();

        assert!(sink.write("first\n".to_string()));
        assert!(sink.write("second\n".to_string()));
        sink.close().await;

        let errors = console.lines_at(LogLevel::Error);
        assert!(!errors.is_empty());
        for error in &errors {
            let message = error.message();
            assert!(message.contains("/dev/full"), "unexpected message: {}", message);
            assert!(message.contains("os error 28"), "unexpected message: {}", message);
        }
    }

    #[tokio::test]
    async fn test_backpressure_signal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.log");
        let sink = open(&path);

        let big = "x".repeat(HIGH_WATER_MARK + 1);
        assert!(!sink.write(big));
        sink.drain().await;
        assert!(sink.pending_bytes() < HIGH_WATER_MARK);

        sink.close().await;
        assert_eq!(fs::metadata(&path).unwrap().len() as usize, HIGH_WATER_MARK + 1);
    }

    #[tokio::test]
    async fn test_write_after_close_reported() {
        let dir = tempdir().unwrap();
        let console = Arc::new(MemoryConsole::new());
        let path = dir.path().join("app.log");
        let sink = FileSink::open(path, console.clone(), TimestampFormat::default()).unwrap();

        sink.close().await;
        assert!(sink.write("late\n".to_string()));

        let warnings = console.lines_at(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message().contains("closed log file"));
    }

    #[test]
    fn test_open_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");
        let result = FileSink::open(path, Arc::new(NoOpConsole), TimestampFormat::default());
        assert!(result.is_err());
    }
}
